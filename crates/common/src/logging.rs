//! Logging utilities for failover-agent components.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing from configured level and format.
///
/// RUST_LOG still takes precedence over the configured level; the default
/// level is INFO. An unrecognized format falls back to plain text.
pub fn init_from(level: Option<&str>, format: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    if matches!(format, Some("json")) {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
