use crate::error::{Result, RulzError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

/// Placeholder URI shipped in fresh configs. Remote storage is attempted
/// only once this has been changed to a real endpoint.
pub const REMOTE_URI_PLACEHOLDER: &str = "https://rules.example.com";

/// Configuration for the rule engine, stored in .rulz/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulzConfig {
    /// Remote rule-collection endpoint; the placeholder disables remote storage
    #[serde(default = "default_remote_uri")]
    pub remote_uri: String,

    /// Fall back to the local rule file when the remote backend is unavailable
    #[serde(default = "default_fallback")]
    pub fallback_to_local: bool,

    /// Cap on stored rules per scope name
    #[serde(default = "default_max_rules_per_scope")]
    pub max_rules_per_scope: usize,

    /// Remote connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Remote per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Remote connection attempts before giving up
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Double the retry delay after each failed attempt
    #[serde(default = "default_exponential_backoff")]
    pub exponential_backoff: bool,

    /// Upper bound on pooled remote connections
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
}

fn default_remote_uri() -> String {
    REMOTE_URI_PLACEHOLDER.to_string()
}

fn default_fallback() -> bool {
    true
}

fn default_max_rules_per_scope() -> usize {
    100
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_exponential_backoff() -> bool {
    true
}

fn default_max_pool_size() -> usize {
    10
}

impl Default for RulzConfig {
    fn default() -> Self {
        Self {
            remote_uri: default_remote_uri(),
            fallback_to_local: default_fallback(),
            max_rules_per_scope: default_max_rules_per_scope(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            exponential_backoff: default_exponential_backoff(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

impl RulzConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(RulzError::Io)?;
        let config: RulzConfig =
            serde_json::from_str(&content).map_err(RulzError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(RulzError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(RulzError::Serialization)?;
        fs::write(config_path, content).map_err(RulzError::Io)?;
        Ok(())
    }

    /// True when a real remote endpoint is configured
    pub fn remote_configured(&self) -> bool {
        !self.remote_uri.is_empty() && self.remote_uri != REMOTE_URI_PLACEHOLDER
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RulzConfig::default();
        assert_eq!(config.remote_uri, REMOTE_URI_PLACEHOLDER);
        assert!(config.fallback_to_local);
        assert_eq!(config.max_rules_per_scope, 100);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_base_delay_ms, 500);
        assert!(config.exponential_backoff);
    }

    #[test]
    fn test_placeholder_uri_does_not_count_as_remote() {
        let mut config = RulzConfig::default();
        assert!(!config.remote_configured());

        config.remote_uri = String::new();
        assert!(!config.remote_configured());

        config.remote_uri = "https://rules.internal:8081".to_string();
        assert!(config.remote_configured());
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let config = RulzConfig::load(temp.path().join("never-created")).unwrap();
        assert_eq!(config, RulzConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();

        let mut config = RulzConfig::default();
        config.remote_uri = "https://rules.internal:8081".to_string();
        config.retry_attempts = 5;
        config.save(temp.path()).unwrap();

        let loaded = RulzConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.remote_uri, "https://rules.internal:8081");
        assert_eq!(loaded.retry_attempts, 5);
    }

    #[test]
    fn test_partial_config_fills_in_defaults() {
        let json = r#"{ "remote_uri": "https://rules.internal:8081" }"#;
        let config: RulzConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.remote_uri, "https://rules.internal:8081");
        assert_eq!(config.max_rules_per_scope, 100);
        assert!(config.fallback_to_local);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = RulzConfig {
            remote_uri: "https://rules.internal:8081".to_string(),
            exponential_backoff: false,
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: RulzConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, parsed);
    }
}
