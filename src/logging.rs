//! Logging setup.
//!
//! Logs go to stderr so streamed answers on stdout stay clean. The filter
//! comes from `IBOT_LOG` (same syntax as `RUST_LOG`), defaulting to `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "IBOT_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from `IBOT_LOG`, falling back to `warn`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
