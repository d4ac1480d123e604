//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber exactly once at startup
//! - Respect RUST_LOG when present, the configured filter otherwise

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `default_filter` is used when RUST_LOG is
/// not set (e.g. `xroad_proxy=info,tower_http=info`).
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
