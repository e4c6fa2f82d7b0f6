//! Shared tracing/logging setup for stockline services.

/// Tracing configuration (filters, output format).
pub mod tracing;

/// Initialize process-wide logging with JSON output.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_json();
}
