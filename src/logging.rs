//! Tracing subscriber setup.
//!
//! Level conventions:
//! - ERROR: a run aborted
//! - WARN: skipped records, byte count mismatches, digest mismatches
//! - INFO: one line per finished file or comparison
//! - DEBUG: per record and per checkpoint progress
//!
//! Logs go to stderr so responses and digests printed on stdout stay clean.

use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// init installs the human readable subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .init();
}

/// init_json installs a subscriber emitting one JSON object per event.
pub fn init_json(level: &str) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .init();
}

/// init_for_tests may be called from every test; only the first call
/// installs the subscriber.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("debug"))
        .with_test_writer()
        .try_init();
}
