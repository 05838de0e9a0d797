//! Result cache around any clustering strategy, with background pre-computation of the
//! neighbouring zoom levels

use super::{Algorithm, discrete_zoom, lock};
use crate::{Cluster, ClusterItem, PrecacheConfig, Result};
use lru::LruCache;
use rand::Rng;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared clustering result for one discrete zoom level
pub type ClusterSet<T> = Arc<Vec<Cluster<T>>>;

/// Memoizes the wrapped strategy's results per discrete zoom level
///
/// Any mutation clears the whole cache. A request for zoom `z` also schedules `z + 1`
/// and `z - 1` on a private worker pool after a random delay, so that zooming in or out
/// usually hits the cache. Pre-computations cannot be cancelled: they keep running after
/// the decorator is dropped and only ever fill the cache.
///
/// Item enumeration is deliberately not exposed; use [`Self::algorithm`] when needed.
pub struct PreCachingAlgorithm<T, A> {
    shared: Arc<Shared<T, A>>,
    pool: Arc<rayon::ThreadPool>,
    config: PrecacheConfig,
}

struct Shared<T, A> {
    algorithm: A,
    cache: Mutex<LruCache<i32, ClusterSet<T>>>,
    _items: PhantomData<fn() -> T>,
}

impl<T: ClusterItem, A: Algorithm<T> + 'static> PreCachingAlgorithm<T, A> {
    pub fn new(algorithm: A, config: PrecacheConfig) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|index| format!("cluster-precache-{index}"))
            .panic_handler(|_| tracing::warn!("cluster pre-computation panicked"))
            .build()?;

        Ok(Self {
            shared: Arc::new(Shared {
                algorithm,
                cache: Mutex::new(LruCache::new(config.capacity()?)),
                _items: PhantomData,
            }),
            pool: Arc::new(pool),
            config,
        })
    }

    /// The wrapped strategy
    #[inline]
    pub fn algorithm(&self) -> &A {
        &self.shared.algorithm
    }

    #[inline]
    pub fn config(&self) -> &PrecacheConfig {
        &self.config
    }

    pub fn add_item(&self, item: T) {
        self.shared.algorithm.add_item(item);
        self.clear_cache();
    }

    pub fn add_items(&self, items: Vec<T>) {
        self.shared.algorithm.add_items(items);
        self.clear_cache();
    }

    pub fn remove_item(&self, item: &T) -> bool {
        let removed = self.shared.algorithm.remove_item(item);
        self.clear_cache();
        removed
    }

    pub fn clear_items(&self) {
        self.shared.algorithm.clear_items();
        self.clear_cache();
    }

    /// Clusters for `zoom`, from the cache when possible
    ///
    /// Concurrent callers asking for the same discrete zoom share a single computation
    /// and receive the same [`ClusterSet`].
    pub fn clusters(&self, zoom: f32) -> ClusterSet<T> {
        let discrete_zoom = discrete_zoom(zoom);
        let results = self.shared.clusters_internal(discrete_zoom);

        if self.config.enabled {
            for neighbour in [discrete_zoom.saturating_add(1), discrete_zoom.saturating_sub(1)] {
                if !self.is_cached(neighbour) {
                    self.schedule_precache(neighbour);
                }
            }
        }

        results
    }

    /// Whether `discrete_zoom` has a cached result (does not affect LRU order)
    pub fn is_cached(&self, discrete_zoom: i32) -> bool {
        lock(&self.shared.cache).contains(&discrete_zoom)
    }

    /// Cached zoom levels, most recently used first
    pub fn cached_zooms(&self) -> Vec<i32> {
        lock(&self.shared.cache).iter().map(|(zoom, _)| *zoom).collect()
    }

    fn clear_cache(&self) {
        lock(&self.shared.cache).clear();
    }

    fn schedule_precache(&self, discrete_zoom: i32) {
        let delay = random_backoff(&self.config);
        let shared = Arc::clone(&self.shared);
        tracing::trace!(discrete_zoom, ?delay, "scheduling cluster pre-computation");

        self.pool.spawn(move || {
            std::thread::sleep(delay);
            shared.clusters_internal(discrete_zoom);
        });
    }
}

impl<T: ClusterItem, A: Algorithm<T>> Shared<T, A> {
    /// Double-checked cache fill: at most one computation per zoom at a time
    fn clusters_internal(&self, discrete_zoom: i32) -> ClusterSet<T> {
        if let Some(results) = lock(&self.cache).get(&discrete_zoom) {
            tracing::trace!(discrete_zoom, "cluster cache hit");
            return Arc::clone(results);
        }

        let mut cache = lock(&self.cache);
        if let Some(results) = cache.get(&discrete_zoom) {
            return Arc::clone(results);
        }

        #[cfg(feature = "profiling")]
        profiling::scope!("precache::compute", format!("zoom={discrete_zoom}").as_str());

        tracing::debug!(discrete_zoom, "cluster cache miss, computing");
        let results: ClusterSet<T> = Arc::new(self.algorithm.clusters(discrete_zoom as f32));
        cache.put(discrete_zoom, Arc::clone(&results));
        results
    }
}

fn random_backoff(config: &PrecacheConfig) -> Duration {
    let (min, max) = config.backoff_range();
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}
