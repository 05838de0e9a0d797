//! Demo driver: generate markers, cluster them at every zoom, report per-zoom summaries

use crate::cli::Settings;
use marker_cluster_lib::{ClusterError, ClusterManager, ClusterResult, LatLng, PoiItem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("Invalid zoom range: {min} > {max}")]
    ZoomRange { min: u8, max: u8 },

    #[error("Invalid extent: {0} (expected a positive number of degrees)")]
    Extent(f64),
}

/// What a renderer would draw at one zoom level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomSummary {
    pub zoom: u8,
    /// Markers drawn in total (cluster icons plus individual pins)
    pub outputs: usize,
    /// Groups large enough to be drawn as a cluster icon
    pub rendered_clusters: usize,
    /// Item count of the largest group
    pub largest: usize,
}

impl ZoomSummary {
    pub fn from_result(
        zoom: u8,
        result: &ClusterResult<PoiItem>,
        manager: &ClusterManager<PoiItem>,
    ) -> Self {
        let mut outputs = 0;
        let mut rendered_clusters = 0;
        let mut largest = 0;

        for cluster in result.clusters.iter() {
            largest = largest.max(cluster.count());
            if manager.should_render_as_cluster(cluster) {
                rendered_clusters += 1;
                outputs += 1;
            } else {
                outputs += cluster.count();
            }
        }

        Self {
            zoom,
            outputs,
            rendered_clusters,
            largest,
        }
    }
}

/// Scatter `count` markers uniformly in a square of half-width `extent` around `center`
pub fn generate_items(
    count: usize,
    center: LatLng,
    extent: f64,
    rng: &mut impl Rng,
) -> Vec<PoiItem> {
    (0..count)
        .map(|id| {
            let latitude = (center.latitude + rng.gen_range(-extent..=extent)).clamp(-90.0, 90.0);
            let longitude = center.longitude + rng.gen_range(-extent..=extent);
            PoiItem::new(id as u64, latitude, longitude).with_title(format!("Marker {id}"))
        })
        .collect()
}

pub fn run(settings: &Settings) -> Result<Vec<ZoomSummary>, DemoError> {
    if settings.min_zoom > settings.max_zoom {
        return Err(DemoError::ZoomRange {
            min: settings.min_zoom,
            max: settings.max_zoom,
        });
    }
    if !(settings.extent.is_finite() && settings.extent > 0.0) {
        return Err(DemoError::Extent(settings.extent));
    }
    let center = LatLng::try_new(settings.lat, settings.lng)?;

    let seed = settings.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, items = settings.items, ?center, "generating markers");
    let mut rng = StdRng::seed_from_u64(seed);
    let items = generate_items(settings.items, center, settings.extent, &mut rng);

    let manager = ClusterManager::new(settings.cluster_config())?;
    manager.add_items(items);
    tracing::info!(
        algorithm = ?manager.config().algorithm,
        items = manager.item_count(),
        "clustering"
    );

    let mut summaries = Vec::new();
    for zoom in settings.min_zoom..=settings.max_zoom {
        #[cfg(feature = "profiling")]
        profiling::scope!("demo::zoom", format!("zoom={zoom}").as_str());

        let Some(result) = manager.on_zoom_changed(f32::from(zoom)) else {
            continue;
        };
        let summary = ZoomSummary::from_result(zoom, &result, &manager);
        tracing::info!(
            zoom,
            outputs = summary.outputs,
            clusters = summary.rendered_clusters,
            largest = summary.largest,
            "zoom level clustered"
        );
        summaries.push(summary);
    }

    Ok(summaries)
}
