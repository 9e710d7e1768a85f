//! Log subscriber setup.
//!
//! `RUST_LOG` overrides the filter from `[logging]`; an unparsable filter
//! falls back to `info`.

use anfitrion_core::LoggingConfig;
use tracing_subscriber::EnvFilter;

const FALLBACK_FILTER: &str = "info";

/// Installs the global `tracing` subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = build_filter(config, std::env::var("RUST_LOG").ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok()
}

fn build_filter(config: &LoggingConfig, env_override: Option<&str>) -> EnvFilter {
    env_override
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(&config.filter).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}
