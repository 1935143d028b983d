//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Level comes from `RUST_LOG`,
/// defaulting to `info`. Calling this twice is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();
}
