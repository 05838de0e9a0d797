use clap::{Parser, ValueEnum};
use marker_cluster_lib::{AlgorithmKind, ClusterConfig, PrecacheConfig};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Marker Cluster Demo - Clusters random markers around a location at every zoom level
pub struct Settings {
    /// Number of random markers to generate
    #[clap(short, long, default_value = "1000")]
    pub items: usize,

    /// Latitude of the area centre (degrees)
    #[clap(long, default_value = "51.503186", allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the area centre (degrees)
    #[clap(long, default_value = "-0.126446", allow_hyphen_values = true)]
    pub lng: f64,

    /// Half-width of the square area markers are scattered in (degrees)
    #[clap(short, long, default_value = "0.2")]
    pub extent: f64,

    /// Clustering strategy
    #[clap(short, long, value_enum, default_value_t = AlgorithmArg::Distance)]
    pub algorithm: AlgorithmArg,

    /// First zoom level to cluster at
    #[clap(long, default_value = "0")]
    pub min_zoom: u8,

    /// Last zoom level to cluster at (inclusive)
    #[clap(long, default_value = "20")]
    pub max_zoom: u8,

    /// Grid cell size in pixels (grid strategy)
    #[clap(long, default_value = "100")]
    pub grid_size: u32,

    /// Clustering radius in pixels (distance strategy)
    #[clap(long, default_value = "100.0")]
    pub max_distance: f64,

    /// Groups above this size are reported as rendered clusters
    #[clap(long, default_value = "4")]
    pub min_cluster_size: usize,

    /// Disable background pre-computation of neighbouring zoom levels
    #[clap(long, default_value = "false")]
    pub no_precache: bool,

    /// Seed for the marker generator (random when omitted)
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmArg {
    Grid,
    Distance,
    Simple,
}

impl From<AlgorithmArg> for AlgorithmKind {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Grid => AlgorithmKind::Grid,
            AlgorithmArg::Distance => AlgorithmKind::Distance,
            AlgorithmArg::Simple => AlgorithmKind::Simple,
        }
    }
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            algorithm: self.algorithm.into(),
            grid_size: self.grid_size,
            max_distance_at_zoom: self.max_distance,
            min_cluster_size: self.min_cluster_size,
            precache: PrecacheConfig {
                enabled: !self.no_precache,
                ..PrecacheConfig::default()
            },
            ..ClusterConfig::default()
        }
    }
}
