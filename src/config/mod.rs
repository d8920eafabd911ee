//! Configuration loading for the remediation monitor
//!
//! A configuration document holds the search backend settings, the loop
//! timings and the keyword rules. TOML is the default format; files with a
//! `.json` extension are read as JSON, with keyword rules keyed the same way
//! (`SuccessLog`, `Actions`).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search backend settings
    pub search: SearchConfig,
    /// Polling loop settings
    pub monitor: MonitorConfig,
    /// Keyword rules, keyed by the trigger substring
    pub keywords: BTreeMap<String, KeywordRule>,
}

/// Search backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the Elasticsearch-compatible endpoint
    pub endpoint: String,
    /// Index pattern searched every cycle and for follow-up searches
    pub index_pattern: String,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            index_pattern: "myindex-*".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

/// Default location of the monitor's own log file
pub const DEFAULT_SELF_LOG_PATH: &str = "/logs/analyzer.log";

/// Polling loop and remediation timing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between the end of one cycle and the start of the next
    pub poll_interval_seconds: u64,
    /// Delay between a remediation action and its health re-check
    pub action_delay_seconds: u64,
    /// How far back each error search looks
    pub lookback_seconds: u64,
    /// Path of the monitor's own log file, excluded from every search
    pub self_log_path: PathBuf,
    /// Minimum time between two remediation runs of the same keyword (0 disables)
    pub remediation_cooldown_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 10,
            action_delay_seconds: 10,
            lookback_seconds: 300,
            self_log_path: PathBuf::from(DEFAULT_SELF_LOG_PATH),
            remediation_cooldown_seconds: 0,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_secs(self.action_delay_seconds)
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_seconds)
    }

    /// Cooldown window, `None` when disabled
    pub fn remediation_cooldown(&self) -> Option<Duration> {
        (self.remediation_cooldown_seconds > 0)
            .then(|| Duration::from_secs(self.remediation_cooldown_seconds))
    }
}

/// Remediation rule attached to a keyword
///
/// Field names follow the established configuration file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Message pattern confirming the condition is real
    #[serde(rename = "SuccessLog")]
    pub success_log: String,
    /// Command whose non-empty output means the system is healthy
    pub healthcheck: String,
    /// Corrective commands, tried in order
    #[serde(rename = "Actions", default)]
    pub actions: Vec<RemediationAction>,
}

/// A single remediation command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationAction {
    pub action: String,
}

impl RemediationAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read, a parse
    /// error if the document is malformed, or `ConfigError::ValidationError`
    /// if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse a JSON document without validating it
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "search.endpoint must not be empty".to_string(),
            ));
        }
        if self.search.index_pattern.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "search.index_pattern must not be empty".to_string(),
            ));
        }
        if self.search.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "search.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.monitor.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.poll_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.monitor.lookback_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.lookback_seconds must be greater than 0".to_string(),
            ));
        }

        for (keyword, rule) in &self.keywords {
            if keyword.is_empty() {
                return Err(ConfigError::ValidationError(
                    "keywords must not contain an empty keyword".to_string(),
                ));
            }
            if rule.healthcheck.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "keyword '{}' has an empty healthcheck",
                    keyword
                )));
            }
            if let Some(index) = rule.actions.iter().position(|a| a.action.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "keyword '{}' has an empty action at position {}",
                    keyword, index
                )));
            }
        }

        Ok(())
    }
}
