//! Tracing subscriber setup.
//!
//! Logs go to stderr so that `nr ... --format json` output on stdout stays
//! machine-readable. `RUST_LOG` overrides the configured filter.

use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Build the filter from `RUST_LOG`, falling back to `default_filter`, then
/// to `info` if that does not parse.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn configure_logging(default_filter: &str) {
    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(env_filter(default_filter));

    let _ = tracing_subscriber::registry().with(stderr_log).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_falls_back() {
        // Must not panic on an unparsable directive.
        let _ = env_filter("info,[[[");
        configure_logging("warn");
        configure_logging("debug");
    }
}
