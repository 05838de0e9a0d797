//! Logging setup for the demo binary
//!
//! With the `profiling` feature, library scopes become tracing spans and their
//! durations are logged when they close.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "info";

/// Initialize logging, defaulting to `info` when `RUST_LOG` is unset or invalid
pub fn setup_logging() {
    use tracing_subscriber::fmt;

    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok());

    let fmt_layer = fmt::layer().with_thread_names(true);
    #[cfg(feature = "profiling")]
    let fmt_layer = fmt_layer.with_span_events(fmt::format::FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    registry.init();

    tracing::debug!("Logging initialized");
}

fn env_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
