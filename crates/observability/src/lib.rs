//! Process-wide tracing/logging setup shared by every binary.

/// Subscriber construction (filters, formatting).
pub mod tracing;

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
