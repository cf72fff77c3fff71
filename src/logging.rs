//! Tracing setup for the command-line tool.
//!
//! The filter is read from `MODSHAKE_LOG`, falling back to `RUST_LOG`, and
//! uses the same syntax (e.g. `debug`, `modshake::transform=trace`). With
//! neither set only warnings and errors are shown. Output goes to stderr so
//! it never mixes with rewritten code or JSON reports on stdout.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "MODSHAKE_LOG";

const DEFAULT_FILTER: &str = "warn";

fn build_filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(|val| EnvFilter::builder().parse_lossy(val))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
