//! Configuration for history stores
//!
//! A [`HistoryConfig`] can be built in code, loaded from a YAML or JSON file,
//! or read from environment variables:
//!
//! ```rust,ignore
//! use action_history::config::{FromEnv, HistoryConfig, ValidateConfig};
//!
//! // From a file (format chosen by extension)
//! let config = HistoryConfig::from_file("history.yaml")?;
//!
//! // From FORECAST_HISTORY_MAX_ENTRIES, FORECAST_HISTORY_BUSY_POLICY, ...
//! let config = HistoryConfig::from_env("FORECAST_HISTORY")?;
//! config.validate()?;
//! ```
//!
//! Example YAML:
//!
//! ```yaml
//! max_entries: 200
//! busy_policy: queue
//! event_capacity: 64
//! logging:
//!   level: debug
//!   format: pretty
//! ```

use crate::error::{HistoryError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Trait for types that can be loaded from environment variables.
pub trait FromEnv: Sized {
    /// Load configuration from environment variables with the given prefix.
    fn from_env(prefix: &str) -> Result<Self>;
}

/// Trait for validating configuration.
pub trait ValidateConfig {
    /// Validate the configuration, returning an error if invalid.
    fn validate(&self) -> Result<()>;
}

/// What the store does with an intent that arrives while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Fail immediately with `OperationInProgress`
    #[default]
    Reject,
    /// Wait for the in-flight intent, then run in arrival order
    Queue,
}

impl FromStr for BusyPolicy {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(BusyPolicy::Reject),
            "queue" => Ok(BusyPolicy::Queue),
            other => Err(HistoryError::Config(format!(
                "Invalid busy policy '{}': expected 'reject' or 'queue'",
                other
            ))),
        }
    }
}

/// History store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of actions kept; the oldest are evicted first.
    /// `None` keeps everything for the session.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Handling of overlapping intents
    #[serde(default)]
    pub busy_policy: BusyPolicy,

    /// Buffer size of the event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_event_capacity() -> usize {
    64
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: None,
            busy_policy: BusyPolicy::default(),
            event_capacity: default_event_capacity(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity limit
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Set the busy policy
    pub fn with_busy_policy(mut self, busy_policy: BusyPolicy) -> Self {
        self.busy_policy = busy_policy;
        self
    }

    /// Set the event buffer size
    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }

    /// Load from a YAML or JSON file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = load_config_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl FromEnv for HistoryConfig {
    /// Reads `{prefix}_MAX_ENTRIES`, `{prefix}_BUSY_POLICY`,
    /// `{prefix}_EVENT_CAPACITY`, `{prefix}_LOG_LEVEL` and `{prefix}_LOG_FORMAT`.
    /// Unset variables keep their defaults.
    fn from_env(prefix: &str) -> Result<Self> {
        let mut config = Self::default();

        if let Some(max_entries) = env_parse::<usize>(&format!("{}_MAX_ENTRIES", prefix))? {
            config.max_entries = Some(max_entries);
        }
        if let Some(policy) = env_parse::<BusyPolicy>(&format!("{}_BUSY_POLICY", prefix))? {
            config.busy_policy = policy;
        }
        if let Some(capacity) = env_parse::<usize>(&format!("{}_EVENT_CAPACITY", prefix))? {
            config.event_capacity = capacity;
        }
        if let Ok(level) = std::env::var(format!("{}_LOG_LEVEL", prefix)) {
            config.logging.level = level;
        }
        if let Some(format) = env_parse::<LogFormat>(&format!("{}_LOG_FORMAT", prefix))? {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }
}

impl ValidateConfig for HistoryConfig {
    fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(HistoryError::Config(
                "max_entries must be at least 1 when set".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(HistoryError::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }
        self.logging.validate()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(HistoryError::Config(format!("Invalid log format '{}'", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,

    /// Show timestamps
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timestamps() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: default_timestamps(),
        }
    }
}

impl ValidateConfig for LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(HistoryError::Config(format!("Invalid log level '{}'", other))),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse::<T>().map(Some).map_err(|e| {
            HistoryError::Config(format!(
                "Failed to parse environment variable '{}': {}",
                key, e
            ))
        }),
        Err(_) => Ok(None),
    }
}

/// Load configuration from a file (auto-detect format from extension).
pub fn load_config_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            HistoryError::Config(format!("Unable to determine file extension for {:?}", path))
        })?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content).map_err(|e| {
                HistoryError::Config(format!("Failed to parse YAML config from {:?}: {}", path, e))
            })
        }
        "json" => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                HistoryError::Config(format!("Failed to parse JSON config from {:?}: {}", path, e))
            })
        }
        _ => Err(HistoryError::Config(format!(
            "Unsupported config file extension: {}",
            extension
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_entries, None);
        assert_eq!(config.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HistoryConfig::new()
            .with_max_entries(50)
            .with_busy_policy(BusyPolicy::Queue)
            .with_event_capacity(8);
        assert_eq!(config.max_entries, Some(50));
        assert_eq!(config.busy_policy, BusyPolicy::Queue);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        assert!(HistoryConfig::new().with_max_entries(0).validate().is_err());
        assert!(HistoryConfig::new().with_event_capacity(0).validate().is_err());

        let mut config = HistoryConfig::new();
        config.logging.level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(HistoryError::Config(_))));
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.yaml");
        fs::write(
            &path,
            "max_entries: 200\nbusy_policy: queue\nlogging:\n  level: debug\n  format: json\n",
        )
        .unwrap();

        let config = HistoryConfig::from_file(&path).unwrap();
        assert_eq!(config.max_entries, Some(200));
        assert_eq!(config.busy_policy, BusyPolicy::Queue);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{"busy_policy": "reject", "event_capacity": 16}"#).unwrap();

        let config = HistoryConfig::from_file(&path).unwrap();
        assert_eq!(config.busy_policy, BusyPolicy::Reject);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("history.toml");
        fs::write(&toml_path, "max_entries = 3").unwrap();
        assert!(matches!(
            HistoryConfig::from_file(&toml_path),
            Err(HistoryError::Config(_))
        ));

        let zero_path = dir.path().join("zero.yaml");
        fs::write(&zero_path, "max_entries: 0\n").unwrap();
        assert!(HistoryConfig::from_file(&zero_path).is_err());

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(HistoryConfig::from_file(&missing), Err(HistoryError::Io(_))));
    }

    #[test]
    fn test_from_env() {
        let prefix = "ACTION_HISTORY_TEST_ENV";
        std::env::set_var(format!("{}_MAX_ENTRIES", prefix), "25");
        std::env::set_var(format!("{}_BUSY_POLICY", prefix), "Queue");
        std::env::set_var(format!("{}_LOG_LEVEL", prefix), "warn");

        let config = HistoryConfig::from_env(prefix).unwrap();
        assert_eq!(config.max_entries, Some(25));
        assert_eq!(config.busy_policy, BusyPolicy::Queue);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.logging.level, "warn");

        std::env::remove_var(format!("{}_MAX_ENTRIES", prefix));
        std::env::remove_var(format!("{}_BUSY_POLICY", prefix));
        std::env::remove_var(format!("{}_LOG_LEVEL", prefix));
    }

    #[test]
    fn test_from_env_rejects_bad_values() {
        let prefix = "ACTION_HISTORY_TEST_BAD_ENV";
        std::env::set_var(format!("{}_EVENT_CAPACITY", prefix), "lots");

        assert!(matches!(
            HistoryConfig::from_env(prefix),
            Err(HistoryError::Config(_))
        ));

        std::env::remove_var(format!("{}_EVENT_CAPACITY", prefix));
    }
}
