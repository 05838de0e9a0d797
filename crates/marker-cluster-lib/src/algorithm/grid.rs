//! Grid-based clustering: one cluster per occupied screen-space grid cell

use super::{Algorithm, lock};
use crate::utils::SphericalMercatorProjection;
use crate::{Cluster, ClusterItem, StaticCluster};
use geo::Point;
use std::collections::HashMap;
use std::sync::Mutex;

/// Size of a world tile in device-independent pixels at zoom 0
const TILE_SIZE: f64 = 256.0;

/// Zoom levels above this are clustered as if at this level; cells are already far
/// smaller than what `f64` coordinates can tell apart
pub const MAX_GRID_ZOOM: f32 = 64.0;

/// Buckets items into square cells of `grid_size` pixels at the requested zoom
///
/// Each cluster sits at the centre of its cell. Zoom is used as a continuous value.
#[derive(Debug)]
pub struct GridBasedAlgorithm<T> {
    grid_size: u32,
    items: Mutex<Vec<T>>,
}

impl<T: ClusterItem> GridBasedAlgorithm<T> {
    pub fn new(grid_size: u32) -> Self {
        debug_assert!(grid_size > 0, "grid size must be non-zero");
        Self {
            grid_size,
            items: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of grid cells along one side of the world at `zoom`
    fn num_cells(&self, zoom: f32) -> f64 {
        let zoom = f64::from(zoom.min(MAX_GRID_ZOOM));
        (TILE_SIZE * 2f64.powf(zoom) / f64::from(self.grid_size)).ceil()
    }
}

impl<T: ClusterItem> Default for GridBasedAlgorithm<T> {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Column or row of the cell holding `coordinate`
///
/// Points on the far world edge (`lng = 180`, or latitudes clamped to the southern
/// limit) belong to the last cell instead of a phantom one past it.
#[inline]
fn cell_index(coordinate: f64, num_cells: f64) -> f64 {
    // `+ 0.0` turns -0.0 into 0.0 so both map to the same key
    coordinate.floor().max(0.0).min(num_cells - 1.0) + 0.0
}

/// Cell identity; cell indices are whole numbers, so their bit patterns are exact keys
#[inline]
fn cell_key(cell_x: f64, cell_y: f64) -> (u64, u64) {
    (cell_x.to_bits(), cell_y.to_bits())
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> Algorithm<T> for GridBasedAlgorithm<T> {
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

    fn clusters(&self, zoom: f32) -> Vec<Cluster<T>> {
        let num_cells = self.num_cells(zoom);
        let projection = SphericalMercatorProjection::new(num_cells);

        let mut clusters: Vec<StaticCluster<T>> = Vec::new();
        let mut cells: HashMap<(u64, u64), usize> = HashMap::new();

        let items = lock(&self.items);
        for item in items.iter() {
            let point = projection.to_point(item.position());
            let cell_x = cell_index(point.x(), num_cells);
            let cell_y = cell_index(point.y(), num_cells);

            let index = *cells
                .entry(cell_key(cell_x, cell_y))
                .or_insert_with(|| {
                    let center = projection.to_lat_lng(Point::new(cell_x + 0.5, cell_y + 0.5));
                    clusters.push(StaticCluster::new(center));
                    clusters.len() - 1
                });
            clusters[index].add(item.clone());
        }

        tracing::debug!(
            zoom,
            num_cells,
            items = items.len(),
            clusters = clusters.len(),
            "grid clustering done"
        );

        clusters.into_iter().map(Cluster::Group).collect()
    }
}
