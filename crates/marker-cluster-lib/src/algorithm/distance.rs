//! Distance-based clustering: greedy single-pass merge of items within a zoom-dependent
//! radius, backed by a point quadtree

use super::{Algorithm, discrete_zoom, lock};
use crate::utils::SphericalMercatorProjection;
use crate::{
    Bounds, Cluster, ClusterItem, PointQuadTree, QuadItem, QuadTreeConfig, QuadTreeItem,
    StaticCluster,
};
use geo::Point;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Items are projected onto the unit square
const PROJECTION: SphericalMercatorProjection = SphericalMercatorProjection::new(1.0);

/// Size of a world tile in device-independent pixels at zoom 0
const TILE_SIZE: f64 = 256.0;

/// Non-hierarchical distance-based clustering
///
/// Items are visited in insertion order. Each unvisited item gathers every item inside
/// a square of `max_distance_at_zoom` pixels around it into a new cluster, taking items
/// away from an earlier cluster only when strictly closer to the new one. The result is
/// deterministic but not globally optimal.
#[derive(Debug)]
pub struct DistanceBasedAlgorithm<T> {
    max_distance_at_zoom: f64,
    state: Mutex<DistanceState<T>>,
}

/// Items in insertion order plus their spatial index, always updated together
#[derive(Debug)]
struct DistanceState<T> {
    items: Vec<QuadItem<T>>,
    members: HashSet<T>,
    quad_tree: PointQuadTree<QuadItem<T>>,
}

impl<T: ClusterItem> DistanceBasedAlgorithm<T> {
    pub fn new(max_distance_at_zoom: f64, quadtree: QuadTreeConfig) -> Self {
        Self {
            max_distance_at_zoom,
            state: Mutex::new(DistanceState {
                items: Vec::new(),
                members: HashSet::new(),
                quad_tree: PointQuadTree::with_config(Bounds::new(0.0, 1.0, 0.0, 1.0), quadtree),
            }),
        }
    }

    #[inline]
    pub fn max_distance_at_zoom(&self) -> f64 {
        self.max_distance_at_zoom
    }

    /// Side of the search square at `zoom`, in projected units
    fn span(&self, discrete_zoom: i32) -> f64 {
        self.max_distance_at_zoom / 2f64.powi(discrete_zoom) / TILE_SIZE
    }
}

impl<T: ClusterItem> Default for DistanceBasedAlgorithm<T> {
    fn default() -> Self {
        Self::new(100.0, QuadTreeConfig::default())
    }
}

#[inline]
fn distance_squared(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> Algorithm<T> for DistanceBasedAlgorithm<T> {
    fn add_item(&self, item: T) {
        let mut state = lock(&self.state);
        if state.members.contains(&item) {
            return;
        }

        let quad_item = QuadItem::new(item, &PROJECTION);
        if !state.quad_tree.add(quad_item.clone()) {
            tracing::debug!(
                position = ?quad_item.position(),
                "item projects outside the index, ignoring it"
            );
            return;
        }
        state.members.insert(quad_item.item().clone());
        state.items.push(quad_item);
    }

    fn remove_item(&self, item: &T) -> bool {
        let mut state = lock(&self.state);
        if !state.members.remove(item) {
            return false;
        }

        let quad_item = QuadItem::new(item.clone(), &PROJECTION);
        if let Some(index) = state.items.iter().position(|existing| existing == &quad_item) {
            // The stored point is the one the tree was descended with
            let stored = state.items.remove(index);
            state.quad_tree.remove(&stored);
        }
        true
    }

    fn clear_items(&self) {
        let mut state = lock(&self.state);
        state.items.clear();
        state.members.clear();
        state.quad_tree.clear();
    }

    fn items(&self) -> Vec<T> {
        lock(&self.state)
            .items
            .iter()
            .map(|quad_item| quad_item.item().clone())
            .collect()
    }

    fn clusters(&self, zoom: f32) -> Vec<Cluster<T>> {
        let discrete_zoom = discrete_zoom(zoom);
        let span = self.span(discrete_zoom);

        let state = lock(&self.state);

        let mut visited: HashSet<&QuadItem<T>> = HashSet::with_capacity(state.items.len());
        let mut distance_to_cluster: HashMap<&QuadItem<T>, f64> = HashMap::new();
        let mut item_to_cluster: HashMap<&QuadItem<T>, usize> = HashMap::new();
        let mut results: Vec<Cluster<T>> = Vec::new();

        for candidate in &state.items {
            if visited.contains(candidate) {
                continue;
            }

            let search_bounds = Bounds::from_span(candidate.point(), span);
            let cluster_items = state.quad_tree.search(&search_bounds);

            // Only the candidate itself in range (or nothing, for a degenerate span)
            if cluster_items.len() <= 1 {
                results.push(Cluster::Single(candidate.clone()));
                visited.insert(candidate);
                distance_to_cluster.insert(candidate, 0.0);
                continue;
            }

            let cluster_index = results.len();
            results.push(Cluster::Group(StaticCluster::new(candidate.position())));

            for &cluster_item in &cluster_items {
                let distance = distance_squared(cluster_item.point(), candidate.point());

                if let Some(&existing_distance) = distance_to_cluster.get(cluster_item) {
                    // Equally close or closer to the cluster it already belongs to
                    if existing_distance <= distance {
                        continue;
                    }

                    if let Some(&previous_index) = item_to_cluster.get(cluster_item)
                        && let Cluster::Group(previous) = &mut results[previous_index]
                    {
                        previous.remove(cluster_item.item());
                    }
                }

                distance_to_cluster.insert(cluster_item, distance);
                item_to_cluster.insert(cluster_item, cluster_index);
                if let Cluster::Group(cluster) = &mut results[cluster_index] {
                    cluster.add(cluster_item.item().clone());
                }
            }

            visited.extend(cluster_items);
        }

        debug_assert_eq!(
            results.iter().map(Cluster::count).sum::<usize>(),
            state.items.len(),
            "all clusters combined should make up the original item set"
        );

        tracing::debug!(
            zoom,
            discrete_zoom,
            items = state.items.len(),
            clusters = results.len(),
            "distance clustering done"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LatLng, PoiItem};
    use std::collections::BTreeSet;

    fn algorithm() -> DistanceBasedAlgorithm<PoiItem> {
        DistanceBasedAlgorithm::default()
    }

    fn ids(cluster: &Cluster<PoiItem>) -> BTreeSet<u64> {
        cluster.items().iter().map(|item| item.id).collect()
    }

    /// Deterministic pseudo-random items spread over a few hot spots
    fn clustered_items(count: u64) -> Vec<PoiItem> {
        let centers = [(51.5, -0.12), (48.85, 2.35), (40.71, -74.0), (-33.86, 151.2)];
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        (0..count)
            .map(|id| {
                let (lat, lng) = centers[(id % centers.len() as u64) as usize];
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let dlat = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 2.0;
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let dlng = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 2.0;
                PoiItem::new(id, lat + dlat, lng + dlng)
            })
            .collect()
    }

    fn assert_conserves(algorithm: &DistanceBasedAlgorithm<PoiItem>, zoom: f32) {
        let clusters = algorithm.clusters(zoom);
        let mut seen = HashSet::new();
        for cluster in &clusters {
            assert!(cluster.count() > 0, "empty cluster at zoom {zoom}");
            for item in cluster.items() {
                assert!(seen.insert(item.id), "item {} twice at zoom {zoom}", item.id);
            }
        }
        let expected: HashSet<u64> = algorithm.items().iter().map(|item| item.id).collect();
        assert_eq!(seen, expected, "zoom {zoom}");
    }

    #[test]
    fn test_span() {
        let algorithm = algorithm();
        assert!((algorithm.span(0) - 100.0 / 256.0).abs() < 1e-15);
        assert!((algorithm.span(3) - 100.0 / 8.0 / 256.0).abs() < 1e-15);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0));
        algorithm.add_item(PoiItem::new(2, 0.0001, 0.0001));
        algorithm.add_item(PoiItem::new(3, 50.0, 50.0));

        let clusters = algorithm.clusters(1.0);
        assert_eq!(clusters.len(), 2);

        assert!(!clusters[0].is_single());
        assert_eq!(ids(&clusters[0]), [1, 2].into_iter().collect());
        assert_eq!(clusters[0].position(), LatLng::new(0.0, 0.0));

        assert!(clusters[1].is_single());
        assert_eq!(ids(&clusters[1]), [3].into_iter().collect());
    }

    #[test]
    fn test_fractional_zoom_is_truncated() {
        let algorithm = algorithm();
        // 0.1 degrees apart: together at zoom 9, apart at zoom 10
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0));
        algorithm.add_item(PoiItem::new(2, 0.0, 0.1));

        assert_eq!(algorithm.clusters(9.0).len(), 1);
        assert_eq!(algorithm.clusters(9.99).len(), 1);
        assert_eq!(algorithm.clusters(10.0).len(), 2);
    }

    #[test]
    fn test_conservation() {
        let algorithm = algorithm();
        algorithm.add_items(clustered_items(2000));
        for zoom in [0.0, 3.0, 5.5, 8.0, 12.0, 18.0] {
            assert_conserves(&algorithm, zoom);
        }
    }

    #[test]
    fn test_items_move_to_strictly_closer_cluster() {
        let algorithm = algorithm();
        // Along the equator, zoom 0 span is ~137 degrees of longitude (±68.75)
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0)); // candidate A
        algorithm.add_item(PoiItem::new(2, 0.0, 60.0)); // close to A, much closer to C
        algorithm.add_item(PoiItem::new(3, 0.0, 100.0)); // out of A's range: candidate C

        let clusters = algorithm.clusters(0.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), [1].into_iter().collect());
        assert_eq!(ids(&clusters[1]), [2, 3].into_iter().collect());
        assert_conserves(&algorithm, 0.0);
    }

    #[test]
    fn test_ties_keep_earlier_assignment() {
        let algorithm = algorithm();
        // Longitudes chosen so the projected distances are exactly equal
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0)); // candidate A
        algorithm.add_item(PoiItem::new(2, 0.0, 45.0)); // exactly between A and C
        algorithm.add_item(PoiItem::new(3, 0.0, 90.0)); // candidate C

        let clusters = algorithm.clusters(0.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(ids(&clusters[0]), [1, 2].into_iter().collect());
        assert_eq!(ids(&clusters[1]), [3].into_iter().collect());
        assert_conserves(&algorithm, 0.0);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 10.0, 10.0));
        algorithm.add_item(PoiItem::new(1, 10.0, 10.0));
        assert_eq!(algorithm.items().len(), 1);

        let clusters = algorithm.clusters(4.0);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].is_single());
    }

    #[test]
    fn test_remove_item() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0));
        algorithm.add_item(PoiItem::new(2, 0.0001, 0.0001));

        // The position passed in does not matter, identity does
        assert!(algorithm.remove_item(&PoiItem::new(2, 80.0, 80.0)));
        assert!(!algorithm.remove_item(&PoiItem::new(2, 0.0001, 0.0001)));

        let clusters = algorithm.clusters(1.0);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].is_single());
        assert_eq!(clusters[0].items()[0].id, 1);
    }

    #[test]
    fn test_remove_after_many_inserts() {
        let algorithm = algorithm();
        let items = clustered_items(600);
        algorithm.add_items(items.clone());
        for item in items.iter().filter(|item| item.id % 3 == 0) {
            assert!(algorithm.remove_item(item));
        }
        assert_eq!(algorithm.items().len(), 400);
        assert_conserves(&algorithm, 6.0);
    }

    #[test]
    fn test_clear_items() {
        let algorithm = algorithm();
        algorithm.add_items(clustered_items(100));
        algorithm.clear_items();
        assert!(algorithm.items().is_empty());
        assert!(algorithm.clusters(5.0).is_empty());

        algorithm.add_item(PoiItem::new(1, 0.0, 0.0));
        assert_eq!(algorithm.clusters(5.0).len(), 1);
    }

    #[test]
    fn test_poles_are_indexed() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 90.0, 0.0));
        algorithm.add_item(PoiItem::new(2, -90.0, 180.0));
        assert_eq!(algorithm.items().len(), 2);
        assert_conserves(&algorithm, 2.0);
    }

    #[test]
    fn test_out_of_range_longitude_is_dropped() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 0.0, 200.0));
        assert!(algorithm.items().is_empty());
        assert!(!algorithm.remove_item(&PoiItem::new(1, 0.0, 200.0)));
    }

    #[test]
    fn test_extreme_zoom_yields_singletons() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(1, 0.0, 0.0));
        algorithm.add_item(PoiItem::new(2, 0.0001, 0.0001));

        let clusters = algorithm.clusters(2000.0);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn test_output_order_follows_insertion() {
        let algorithm = algorithm();
        algorithm.add_item(PoiItem::new(5, -30.0, -30.0));
        algorithm.add_item(PoiItem::new(4, 30.0, 30.0));
        algorithm.add_item(PoiItem::new(3, 0.0, 0.0));

        let clusters = algorithm.clusters(10.0);
        let order: Vec<u64> = clusters.iter().map(|cluster| cluster.items()[0].id).collect();
        assert_eq!(order, vec![5, 4, 3]);
    }
}
