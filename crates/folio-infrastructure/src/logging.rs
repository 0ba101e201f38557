//! Tracing subscriber setup.

use folio_core::{FolioError, Result};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (for example `info` or
/// `folio_application=debug,info`) is used.
///
/// # Errors
///
/// - `FolioError::Config` when `default_level` is not a valid filter
/// - `FolioError::Internal` when a global subscriber is already installed
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = build_filter(default_level)?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| FolioError::internal(format!("failed to install tracing subscriber: {}", e)))
}

fn build_filter(default_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(default_level).map_err(|e| {
            FolioError::config(format!("invalid log level '{}': {}", default_level, e))
        })
    })
}
