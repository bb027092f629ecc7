//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events. Applications embedding the
//! store (and the bundled example) call [`init_logging`] once at startup.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{HistoryError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber configured from `config`.
///
/// `RUST_LOG` takes precedence over `config.level` when set. Returns
/// `Ok(false)` if a global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match (config.format, config.timestamps) {
        (LogFormat::Compact, true) => builder.compact().try_init(),
        (LogFormat::Compact, false) => builder.compact().without_time().try_init(),
        (LogFormat::Pretty, true) => builder.pretty().try_init(),
        (LogFormat::Pretty, false) => builder.pretty().without_time().try_init(),
        (LogFormat::Json, true) => builder.json().try_init(),
        (LogFormat::Json, false) => builder.json().without_time().try_init(),
    };

    Ok(installed.is_ok())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| HistoryError::Config(format!("Invalid log level '{}': {}", config.level, e)))
}
