//! Configuration for the SDG portal client.

use crate::tracker::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the portal client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the portal backend; endpoint paths are joined onto it
    pub api_base_url: String,

    /// Scheme placed before the token in the `Authorization` header
    pub auth_scheme: String,

    /// Timeout applied to every backend request
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Quiet window before a scroll is reported
    #[serde(with = "duration_millis")]
    pub scroll_debounce: Duration,

    /// Delay between leaving a page and reading the new one after navigation
    #[serde(with = "duration_millis")]
    pub navigation_settle: Duration,

    /// File holding the stored auth token
    pub token_path: PathBuf,

    /// Port of the local ingest server (`track` command)
    pub ingest_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sdg-portal");

        Self {
            api_base_url: "http://127.0.0.1:8000/".to_string(),
            auth_scheme: "Bearer".to_string(),
            request_timeout: Duration::from_secs(10),
            scroll_debounce: Duration::from_millis(1000),
            navigation_settle: Duration::from_millis(100),
            token_path: data_dir.join("token"),
            ingest_port: 8765,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sdg-portal")
            .join("config.json")
    }

    /// Timer settings for the activity tracker.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            scroll_debounce: self.scroll_debounce,
            navigation_settle: self.navigation_settle,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scroll_debounce, Duration::from_secs(1));
        assert_eq!(config.navigation_settle, Duration::from_millis(100));
        assert_eq!(config.auth_scheme, "Bearer");
        assert!(config.token_path.ends_with("token"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"api_base_url":"https://sdg.example.org/","scroll_debounce":250}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_base_url, "https://sdg.example.org/");
        assert_eq!(config.scroll_debounce, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_tracker_config_from_config() {
        let config = Config {
            navigation_settle: Duration::from_millis(40),
            ..Config::default()
        };
        let tracker = config.tracker_config();
        assert_eq!(tracker.navigation_settle, Duration::from_millis(40));
        assert_eq!(tracker.scroll_debounce, Duration::from_secs(1));
    }
}
