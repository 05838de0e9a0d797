//! ClusterManager - Owns the item set, the active strategy and its result cache
//!
//! Renderers hold one manager per map. Mutations and strategy swaps bump a generation
//! counter so that a result computed before the change can be recognised as stale
//! and discarded instead of being drawn.

use crate::algorithm::{Algorithm, ClusterSet, PreCachingAlgorithm, lock};
use crate::{
    AlgorithmKind, Cluster, ClusterConfig, ClusterItem, DistanceBasedAlgorithm,
    GridBasedAlgorithm, Result, SimpleAlgorithm,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type DynAlgorithm<T> = Box<dyn Algorithm<T>>;

/// Clusters computed for one zoom, tagged with the item generation they reflect
#[derive(Clone)]
pub struct ClusterResult<T> {
    pub generation: u64,
    pub zoom: f32,
    pub clusters: ClusterSet<T>,
}

impl<T> ClusterResult<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl<T> std::fmt::Debug for ClusterResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterResult")
            .field("generation", &self.generation)
            .field("zoom", &self.zoom)
            .field("clusters", &self.clusters.len())
            .finish()
    }
}

/// Top-level entry point for clustering a set of markers
pub struct ClusterManager<T: ClusterItem> {
    algorithm: RwLock<PreCachingAlgorithm<T, DynAlgorithm<T>>>,
    config: ClusterConfig,
    generation: AtomicU64,
    /// Last zoom passed to [`Self::on_zoom_changed`]
    previous_zoom: Mutex<Option<f32>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> ClusterManager<T> {
    /// Create a manager running the strategy selected by `config.algorithm`
    pub fn new(config: ClusterConfig) -> Result<Self> {
        let algorithm = build_algorithm(&config);
        Self::with_algorithm(config, algorithm)
    }

    /// Create a manager around a caller-provided strategy
    pub fn with_algorithm(config: ClusterConfig, algorithm: DynAlgorithm<T>) -> Result<Self> {
        config.validate()?;
        let algorithm = PreCachingAlgorithm::new(algorithm, config.precache.clone())?;

        Ok(Self {
            algorithm: RwLock::new(algorithm),
            config,
            generation: AtomicU64::new(0),
            previous_zoom: Mutex::new(None),
        })
    }

    #[inline]
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Current item generation, bumped by every mutation
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn add_item(&self, item: T) {
        let algorithm = self.write();
        algorithm.add_item(item);
        self.bump_generation();
    }

    pub fn add_items(&self, items: Vec<T>) {
        let algorithm = self.write();
        tracing::debug!(count = items.len(), "adding items");
        algorithm.add_items(items);
        self.bump_generation();
    }

    pub fn remove_item(&self, item: &T) -> bool {
        let algorithm = self.write();
        let removed = algorithm.remove_item(item);
        self.bump_generation();
        removed
    }

    pub fn clear_items(&self) {
        let algorithm = self.write();
        algorithm.clear_items();
        self.bump_generation();
    }

    /// Snapshot of the managed items
    pub fn items(&self) -> Vec<T> {
        self.read().algorithm().items()
    }

    pub fn item_count(&self) -> usize {
        self.items().len()
    }

    /// Swap the strategy, carrying every current item over
    ///
    /// The result cache starts empty, pre-computations still running for the previous
    /// strategy only fill the discarded cache.
    pub fn set_algorithm(&self, algorithm: DynAlgorithm<T>) -> Result<()> {
        let mut current = self.write();

        let items = current.algorithm().items();
        tracing::info!(items = items.len(), "switching clustering algorithm");
        algorithm.add_items(items);

        *current = PreCachingAlgorithm::new(algorithm, self.config.precache.clone())?;
        self.bump_generation();
        Ok(())
    }

    /// Swap to one of the built-in strategies
    pub fn set_algorithm_kind(&self, kind: AlgorithmKind) -> Result<()> {
        let config = ClusterConfig {
            algorithm: kind,
            ..self.config.clone()
        };
        self.set_algorithm(build_algorithm(&config))
    }

    /// Clusters for `zoom`, from the cache when possible
    pub fn cluster(&self, zoom: f32) -> ClusterResult<T> {
        let algorithm = self.read();
        // Read under the lock so the generation matches the computed clusters
        let generation = self.generation();
        let clusters = algorithm.clusters(zoom);

        ClusterResult {
            generation,
            zoom,
            clusters,
        }
    }

    /// Re-cluster after a camera change
    ///
    /// Returns `None` when the zoom is unchanged (pan, tilt or rotate only), since the
    /// clusters cannot differ.
    pub fn on_zoom_changed(&self, zoom: f32) -> Option<ClusterResult<T>> {
        {
            let mut previous = lock(&self.previous_zoom);
            if *previous == Some(zoom) {
                return None;
            }
            *previous = Some(zoom);
        }
        Some(self.cluster(zoom))
    }

    /// Whether `result` still reflects the current items and strategy
    #[inline]
    pub fn is_current(&self, result: &ClusterResult<T>) -> bool {
        result.generation == self.generation()
    }

    #[inline]
    pub fn should_render_as_cluster(&self, cluster: &Cluster<T>) -> bool {
        self.config.should_render_as_cluster(cluster)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn read(&self) -> RwLockReadGuard<'_, PreCachingAlgorithm<T, DynAlgorithm<T>>> {
        self.algorithm.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PreCachingAlgorithm<T, DynAlgorithm<T>>> {
        self.algorithm.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_algorithm<T: ClusterItem>(config: &ClusterConfig) -> DynAlgorithm<T> {
    match config.algorithm {
        AlgorithmKind::Grid => Box::new(GridBasedAlgorithm::new(config.grid_size)),
        AlgorithmKind::Distance => Box::new(DistanceBasedAlgorithm::new(
            config.max_distance_at_zoom,
            config.quadtree,
        )),
        AlgorithmKind::Simple => Box::new(SimpleAlgorithm::new(config.simple_cluster_count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClusterError, PoiItem, PrecacheConfig};

    fn test_config(algorithm: AlgorithmKind) -> ClusterConfig {
        ClusterConfig {
            algorithm,
            precache: PrecacheConfig {
                enabled: false,
                ..PrecacheConfig::default()
            },
            ..ClusterConfig::default()
        }
    }

    fn london_items() -> Vec<PoiItem> {
        (0..10)
            .map(|id| PoiItem::new(id, 51.5 + id as f64 * 0.0001, -0.12))
            .collect()
    }

    #[test]
    fn test_cluster_nearby_items() {
        let manager = ClusterManager::new(test_config(AlgorithmKind::Distance)).unwrap();
        manager.add_items(london_items());
        manager.add_item(PoiItem::new(100, -33.86, 151.2));

        let result = manager.cluster(5.0);
        assert_eq!(result.len(), 2);
        assert_eq!(manager.item_count(), 11);

        let group = result
            .clusters
            .iter()
            .find(|cluster| cluster.count() == 10)
            .expect("london group");
        assert!(manager.should_render_as_cluster(group));

        let single = result
            .clusters
            .iter()
            .find(|cluster| cluster.count() == 1)
            .expect("sydney marker");
        assert!(!manager.should_render_as_cluster(single));
    }

    #[test]
    fn test_mutations_make_results_stale() {
        let manager = ClusterManager::new(test_config(AlgorithmKind::Grid)).unwrap();
        manager.add_items(london_items());

        let before = manager.cluster(3.0);
        assert!(manager.is_current(&before));

        assert!(manager.remove_item(&PoiItem::new(0, 0.0, 0.0)));
        assert!(!manager.is_current(&before));

        let after = manager.cluster(3.0);
        assert!(manager.is_current(&after));
        assert_eq!(after.clusters[0].count(), 9);

        manager.clear_items();
        assert!(manager.cluster(3.0).is_empty());
    }

    #[test]
    fn test_zoom_change_skips_same_zoom() {
        let manager = ClusterManager::new(test_config(AlgorithmKind::Distance)).unwrap();
        manager.add_items(london_items());

        assert!(manager.on_zoom_changed(4.0).is_some());
        assert!(manager.on_zoom_changed(4.0).is_none());
        let result = manager.on_zoom_changed(4.5).expect("zoom changed");
        assert_eq!(result.zoom, 4.5);
    }

    #[test]
    fn test_switch_algorithm_keeps_items() {
        let manager = ClusterManager::new(test_config(AlgorithmKind::Distance)).unwrap();
        manager.add_items(london_items());
        let before = manager.cluster(2.0);

        manager.set_algorithm_kind(AlgorithmKind::Grid).unwrap();
        assert!(!manager.is_current(&before));
        assert_eq!(manager.item_count(), 10);

        let result = manager.cluster(2.0);
        assert_eq!(result.len(), 1);
        assert!(!result.clusters[0].is_single());
        assert_eq!(result.clusters[0].count(), 10);
    }

    #[test]
    fn test_simple_algorithm_kind() {
        let config = ClusterConfig {
            simple_cluster_count: 3,
            ..test_config(AlgorithmKind::Simple)
        };
        let manager = ClusterManager::new(config).unwrap();
        manager.add_items(london_items());

        let result = manager.cluster(15.0);
        assert_eq!(result.len(), 3);
        assert_eq!(result.clusters.iter().map(Cluster::count).sum::<usize>(), 10);
    }

    #[test]
    fn test_custom_algorithm() {
        let manager = ClusterManager::with_algorithm(
            test_config(AlgorithmKind::Distance),
            Box::new(GridBasedAlgorithm::new(50)),
        )
        .unwrap();
        manager.add_item(PoiItem::new(1, 0.0, 0.0));
        assert_eq!(manager.cluster(0.0).len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClusterConfig {
            grid_size: 0,
            ..ClusterConfig::default()
        };
        assert!(matches!(
            ClusterManager::<PoiItem>::new(config),
            Err(ClusterError::InvalidConfig(_))
        ));
    }
}
