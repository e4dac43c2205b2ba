//! Structured logging for suite loading and step execution.
//!
//! Logs go to stderr so they do not interleave with reporter output on
//! stdout. The configured level applies to this crate and the harness;
//! other crates log warnings and above.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

fn filter_for(level: LogLevel) -> EnvFilter {
    let level = level.name();
    EnvFilter::new(format!("warn,bdd_suite={level},bdd_suite_harness={level}"))
}

/// Install a global `tracing` subscriber for a test run.
///
/// Does nothing when a global subscriber is already installed, so calling it
/// from several test binaries or loaders is harmless.
pub fn init_logging(level: LogLevel) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .compact()
        .without_time()
        .try_init();
    if installed.is_ok() {
        tracing::debug!(%level, "logging initialised");
    }
}
