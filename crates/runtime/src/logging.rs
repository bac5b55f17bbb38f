//! Tracing subscriber setup for binaries and tests embedding the runtime.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a global fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `info`.
///
/// Returns false when a global subscriber was already installed.
pub fn init_logging() -> bool {
    init_logging_with("info")
}

/// Same as [`init_logging`] with an explicit fallback directive, e.g.
/// `"battle=debug,runtime=info"`.
pub fn init_logging_with(default_directive: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
