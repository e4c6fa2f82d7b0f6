//! Tracing/logging initialization.
//!
//! Availability recalculations and request transitions emit structured
//! events (`tracing::info!`/`warn!` with field values); this module wires
//! them to stdout. Filtering is driven by `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// JSON lines on stdout, one event per line. Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init_json() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Human-readable output for local runs and test debugging.
pub fn init_pretty() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .try_init();
}
