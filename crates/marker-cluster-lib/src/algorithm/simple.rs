//! Fixed-count clustering: items dealt round-robin into a constant number of clusters
//!
//! Ignores geography and zoom entirely, so it is only useful as a baseline when
//! debugging renderers or benchmarking the other strategies.

use super::{Algorithm, lock};
use crate::{Cluster, ClusterItem, StaticCluster};
use std::sync::Mutex;

/// Deals items into `cluster_count` clusters placed at the first items' positions
///
/// Item `i` (in insertion order) joins cluster `i % cluster_count`.
#[derive(Debug)]
pub struct SimpleAlgorithm<T> {
    cluster_count: usize,
    items: Mutex<Vec<T>>,
}

impl<T: ClusterItem> SimpleAlgorithm<T> {
    pub fn new(cluster_count: usize) -> Self {
        debug_assert!(cluster_count > 0, "cluster count must be non-zero");
        Self {
            cluster_count: cluster_count.max(1),
            items: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }
}

impl<T: ClusterItem> Default for SimpleAlgorithm<T> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<T: ClusterItem> Algorithm<T> for SimpleAlgorithm<T> {
    fn add_item(&self, item: T) {
        lock(&self.items).push(item);
    }

    fn add_items(&self, items: Vec<T>) {
        lock(&self.items).extend(items);
    }

    fn remove_item(&self, item: &T) -> bool {
        let mut items = lock(&self.items);
        match items.iter().position(|existing| existing == item) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    fn clear_items(&self) {
        lock(&self.items).clear();
    }

    fn items(&self) -> Vec<T> {
        lock(&self.items).clone()
    }

    fn clusters(&self, _zoom: f32) -> Vec<Cluster<T>> {
        let items = lock(&self.items);

        let mut clusters: Vec<StaticCluster<T>> = items
            .iter()
            .take(self.cluster_count)
            .map(|item| StaticCluster::new(item.position()))
            .collect();

        for (index, item) in items.iter().enumerate() {
            clusters[index % self.cluster_count].add(item.clone());
        }

        clusters.into_iter().map(Cluster::Group).collect()
    }
}
