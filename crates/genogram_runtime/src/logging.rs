//! Structured logging bootstrap.
//!
//! Log output goes to stderr so it never mixes with REPL output on stdout.
//! `RUST_LOG` takes precedence over the configured filter.

use genogram_foundation::{Error, ErrorKind, Result};
use tracing_subscriber::EnvFilter;

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `fallback`.
///
/// # Errors
///
/// Returns an error if `fallback` is not a valid filter directive.
pub fn filter(fallback: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(fallback).map_err(|e| {
        Error::new(ErrorKind::Internal(format!(
            "invalid log filter '{fallback}': {e}"
        )))
    })
}

/// Installs the global subscriber.
///
/// Calling this more than once is harmless; later calls report an error and
/// leave the first subscriber in place.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(fallback: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(fallback)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::new(ErrorKind::Internal(format!("logging already initialized: {e}"))))
}
