//! Tracing/logging initialization.
//!
//! JSON lines on stdout. The filter comes from `RUST_LOG` and falls back to
//! `info` for everything plus `debug` for the cashpoint crates when unset.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,cashpoint_api=debug,cashpoint_infra=debug";

/// Build the filter used by [`init`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(true)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
        ::tracing::info!("still logging");
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
