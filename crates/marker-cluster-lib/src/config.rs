//! Configuration for the clustering engine
//!
//! All knobs have defaults tuned for typical map marker clustering, so
//! `ClusterConfig::default()` is a sensible starting point for map renderers.

use crate::{Cluster, ClusterError, Result};
use std::num::NonZeroUsize;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which clustering strategy a [`crate::ClusterManager`] builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlgorithmKind {
    /// Fixed-size screen-space grid buckets
    Grid,
    /// Greedy nearest-neighbour merge backed by a quadtree
    #[default]
    Distance,
    /// Fixed number of round-robin clusters, ignoring position and zoom
    Simple,
}

/// Split thresholds for [`crate::PointQuadTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadTreeConfig {
    /// A leaf splits once it holds more than this many items
    pub max_elements: usize,
    /// Leaves at this depth never split
    pub max_depth: u32,
}

impl QuadTreeConfig {
    /// Larger leaves, shallower tree (64 items, depth 30)
    pub const fn compact() -> Self {
        Self {
            max_elements: 64,
            max_depth: 30,
        }
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_elements: 50,
            max_depth: 40,
        }
    }
}

/// Result cache and background pre-computation settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrecacheConfig {
    /// Whether neighbouring zoom levels are computed in the background
    pub enabled: bool,
    /// Number of cached zoom levels (LRU)
    pub cache_capacity: usize,
    /// Lower bound of the random delay before a pre-computation starts
    pub backoff_min_ms: u64,
    /// Upper bound (inclusive) of the random delay
    pub backoff_max_ms: u64,
    /// Worker threads dedicated to pre-computation
    pub threads: usize,
}

impl PrecacheConfig {
    pub(crate) fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| ClusterError::InvalidConfig("cache capacity must be non-zero".into()))
    }

    pub fn backoff_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.backoff_min_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }

    pub fn validate(&self) -> Result<()> {
        self.capacity()?;
        if self.threads == 0 {
            return Err(ClusterError::InvalidConfig(
                "pre-cache pool needs at least one thread".into(),
            ));
        }
        if self.backoff_min_ms > self.backoff_max_ms {
            return Err(ClusterError::InvalidConfig(format!(
                "backoff range is empty: {}ms > {}ms",
                self.backoff_min_ms, self.backoff_max_ms
            )));
        }
        Ok(())
    }
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_capacity: 5,
            backoff_min_ms: 500,
            backoff_max_ms: 1000,
            threads: 2,
        }
    }
}

/// Top-level configuration for a [`crate::ClusterManager`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterConfig {
    /// Strategy built by [`crate::ClusterManager::new`]
    pub algorithm: AlgorithmKind,
    /// Grid cell size in device-independent pixels (grid strategy)
    pub grid_size: u32,
    /// Clustering radius in device-independent pixels (distance strategy)
    pub max_distance_at_zoom: f64,
    /// Quadtree thresholds (distance strategy)
    pub quadtree: QuadTreeConfig,
    /// Number of clusters built (simple strategy)
    pub simple_cluster_count: usize,
    /// Clusters with at most this many items should be drawn as individual markers.
    /// Only consulted by renderers through [`ClusterConfig::should_render_as_cluster`].
    pub min_cluster_size: usize,
    pub precache: PrecacheConfig,
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(ClusterError::InvalidConfig(
                "grid size must be non-zero".into(),
            ));
        }
        if !(self.max_distance_at_zoom.is_finite() && self.max_distance_at_zoom > 0.0) {
            return Err(ClusterError::InvalidConfig(format!(
                "max distance at zoom must be positive, got {}",
                self.max_distance_at_zoom
            )));
        }
        if self.simple_cluster_count == 0 {
            return Err(ClusterError::InvalidConfig(
                "simple cluster count must be non-zero".into(),
            ));
        }
        if self.quadtree.max_elements == 0 {
            return Err(ClusterError::InvalidConfig(
                "quadtree max elements must be non-zero".into(),
            ));
        }
        self.precache.validate()
    }

    /// Whether a renderer should draw `cluster` as one cluster marker
    #[inline]
    pub fn should_render_as_cluster<T>(&self, cluster: &Cluster<T>) -> bool {
        cluster.count() > self.min_cluster_size
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::default(),
            grid_size: 100,
            max_distance_at_zoom: 100.0,
            quadtree: QuadTreeConfig::default(),
            simple_cluster_count: 10,
            min_cluster_size: 4,
            precache: PrecacheConfig::default(),
        }
    }
}
