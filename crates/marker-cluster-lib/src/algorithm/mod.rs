//! Clustering strategies
//!
//! Every strategy owns its item set behind its own lock, so all methods take `&self`
//! and a strategy can be shared between the caller and background pre-computation.

mod distance;
mod grid;
mod precache;
mod simple;

pub use distance::DistanceBasedAlgorithm;
pub use grid::{GridBasedAlgorithm, MAX_GRID_ZOOM};
pub use precache::{ClusterSet, PreCachingAlgorithm};
pub use simple::SimpleAlgorithm;

use crate::{Cluster, ClusterItem};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Zoom used as cache key and clustering granularity (truncated toward zero)
#[inline]
pub fn discrete_zoom(zoom: f32) -> i32 {
    zoom as i32
}

/// Lock a mutex, recovering the data if a previous holder panicked
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A clustering strategy over a mutable item set
pub trait Algorithm<T: ClusterItem>: Send + Sync {
    fn add_item(&self, item: T);

    fn add_items(&self, items: Vec<T>) {
        for item in items {
            self.add_item(item);
        }
    }

    /// Remove an item, returning whether it was present
    fn remove_item(&self, item: &T) -> bool;

    fn clear_items(&self);

    /// Snapshot of the current items in insertion order
    fn items(&self) -> Vec<T>;

    /// Group the current items for display at `zoom`
    fn clusters(&self, zoom: f32) -> Vec<Cluster<T>>;
}

impl<T: ClusterItem, A: Algorithm<T> + ?Sized> Algorithm<T> for Box<A> {
    fn add_item(&self, item: T) {
        (**self).add_item(item)
    }

    fn add_items(&self, items: Vec<T>) {
        (**self).add_items(items)
    }

    fn remove_item(&self, item: &T) -> bool {
        (**self).remove_item(item)
    }

    fn clear_items(&self) {
        (**self).clear_items()
    }

    fn items(&self) -> Vec<T> {
        (**self).items()
    }

    fn clusters(&self, zoom: f32) -> Vec<Cluster<T>> {
        (**self).clusters(zoom)
    }
}
