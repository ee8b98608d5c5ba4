//! Logging setup for binaries
//!
//! Filter comes from `RUST_LOG`, falling back to `info`. JSON output is meant
//! for log shippers; the plain format is for terminals.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Default filter directive
pub const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Filter from `RUST_LOG`, or [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber; fails if one is already set
pub fn init(format: LogFormat) -> Result<(), TelemetryError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| TelemetryError::Install(e.to_string()))
}
