//! Marker Cluster Library - Zoom-dependent grouping of map markers
//!
//! This library groups geographic points of interest into clusters so that a map renderer
//! can draw one marker per group instead of thousands of overlapping pins. Clustering
//! happens in a projected Web Mercator plane and depends only on the zoom level.
//!
//! # Architecture
//!
//! - **[`SphericalMercatorProjection`]**: Geographic to planar mapping
//! - **[`PointQuadTree`]**: Region quadtree for rectangular range queries
//! - **[`GridBasedAlgorithm`]**: One cluster per occupied screen-space grid cell
//! - **[`DistanceBasedAlgorithm`]**: Greedy radius merge backed by the quadtree
//! - **[`SimpleAlgorithm`]**: Fixed number of round-robin clusters, a debugging baseline
//! - **[`PreCachingAlgorithm`]**: LRU result cache with background neighbour-zoom fill
//! - **[`ClusterManager`]**: High-level owner of items, strategy and cache
//!
//! # Performance Characteristics
//!
//! - **Grid**: O(N) per zoom level
//! - **Distance**: O(N log N) expected per zoom level, O(N²) when everything overlaps
//! - **Cached zoom**: O(1), shared between callers through an `Arc`

mod algorithm;
mod bounds;
mod cluster;
mod config;
mod manager;
mod quadtree;
pub mod utils;

// Public API exports
pub use algorithm::{
    Algorithm, ClusterSet, DistanceBasedAlgorithm, GridBasedAlgorithm, MAX_GRID_ZOOM,
    PreCachingAlgorithm, SimpleAlgorithm, discrete_zoom,
};
pub use bounds::Bounds;
pub use cluster::{Cluster, ClusterItem, PoiItem, QuadItem, StaticCluster};
pub use config::{AlgorithmKind, ClusterConfig, PrecacheConfig, QuadTreeConfig};
pub use manager::{ClusterManager, ClusterResult};
pub use quadtree::{PointQuadTree, QuadTreeItem};
pub use utils::{LatLng, SphericalMercatorProjection};

/// Error types for the clustering engine
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

pub type Result<T> = std::result::Result<T, ClusterError>;
