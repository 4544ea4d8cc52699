//! Client configuration
//!
//! `ClientConfig` can be built in code, deserialized from YAML, or filled
//! from the environment. Every section has serde defaults so a config file
//! only needs the fields it wants to change.

use crate::error::{Error, Result};
use crate::types::{BackoffType, Environment};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted for the API key
pub const API_KEY_ENV: &str = "PDS_APIKEY";

/// Environment variable consulted for the environment name
pub const ENVIRONMENT_ENV: &str = "PDS_ENVIRONMENT";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Named deployment used to pick the search URL
    #[serde(default)]
    pub environment: Environment,

    /// Explicit search URL, overrides `environment`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum attempts per logical request
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Backoff between attempts of one request
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Token bucket in front of every request
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Backlog throttle applied before each continuation request
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: Environment::default(),
            base_url: None,
            page_size: default_page_size(),
            retry_limit: default_retry_limit(),
            timeout_seconds: default_timeout(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: RateLimitConfig::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

fn default_retry_limit() -> u32 {
    3
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Create a config with the given API key and defaults elsewhere
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Defaults plus `PDS_APIKEY` / `PDS_ENVIRONMENT` when set
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Fill the API key and environment from process environment variables
    ///
    /// Values already present in the config win over the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        if let Ok(name) = std::env::var(ENVIRONMENT_ENV) {
            self.environment = Environment::from_name(&name);
        }
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the environment
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Point the client at an explicit search URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the retry limit
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs().max(1);
        self
    }

    /// Set backoff between retries
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the request rate limit
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the backlog throttle delays
    #[must_use]
    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Search URL this config resolves to
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    /// The API key, or `MissingApiKey` when absent or blank
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey),
        }
    }

    /// Check the config for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        self.require_api_key()?;

        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.retry_limit == 0 {
            return Err(Error::invalid_value("retry_limit", "must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be at least 1"));
        }
        if self.rate_limit.enabled && self.rate_limit.requests_per_second == 0 {
            return Err(Error::invalid_value(
                "rate_limit.requests_per_second",
                "must be at least 1",
            ));
        }

        url::Url::parse(self.resolved_base_url())?;
        Ok(())
    }
}

// ============================================================================
// Backoff Config
// ============================================================================

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Upper bound on any single delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::default(),
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    250
}

fn default_max_ms() -> u64 {
    10_000
}

impl BackoffConfig {
    /// No delay between attempts
    pub fn none() -> Self {
        Self {
            backoff_type: BackoffType::Constant,
            initial_ms: 0,
            max_ms: 0,
        }
    }

    /// Initial delay
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    /// Maximum delay
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

// ============================================================================
// Rate Limit Config
// ============================================================================

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether requests go through the token bucket at all
    #[serde(default)]
    pub enabled: bool,

    /// Sustained requests per second
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Bucket size
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_rps(),
            burst: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    5
}

// ============================================================================
// Throttle Config
// ============================================================================

/// Delays used by the backlog throttle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Wait before every continuation request
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Wait when the backlog exceeds the limit
    #[serde(default = "default_medium_delay_ms")]
    pub medium_delay_ms: u64,

    /// Wait when the backlog exceeds twice the limit
    #[serde(default = "default_long_delay_ms")]
    pub long_delay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            medium_delay_ms: default_medium_delay_ms(),
            long_delay_ms: default_long_delay_ms(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_medium_delay_ms() -> u64 {
    60_000
}

fn default_long_delay_ms() -> u64 {
    120_000
}

impl ThrottleConfig {
    /// Build from explicit durations
    pub fn new(min: Duration, medium: Duration, long: Duration) -> Self {
        Self {
            min_delay_ms: min.as_millis() as u64,
            medium_delay_ms: medium.as_millis() as u64,
            long_delay_ms: long.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.throttle, ThrottleConfig::default());
        assert_eq!(config.throttle.medium_delay_ms, 60_000);
        assert_eq!(config.throttle.long_delay_ms, 120_000);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new("key")
            .with_environment(Environment::Dev)
            .with_page_size(10)
            .with_retry_limit(5)
            .with_timeout(Duration::from_secs(5))
            .with_backoff(BackoffConfig::none());

        assert_eq!(config.api_key.as_deref(), Some("key"));
        assert_eq!(config.resolved_base_url(), Environment::Dev.base_url());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.retry_backoff.initial(), Duration::ZERO);
    }

    #[test]
    fn test_base_url_override_wins() {
        let config = ClientConfig::new("key")
            .with_environment(Environment::Stage)
            .with_base_url("http://localhost:9999/search");
        assert_eq!(config.resolved_base_url(), "http://localhost:9999/search");
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r"
api_key: abc
environment: test
page_size: 100
retry_backoff:
  type: linear
  initial_ms: 10
throttle:
  medium_delay_ms: 5000
";
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.retry_backoff.backoff_type, BackoffType::Linear);
        assert_eq!(config.retry_backoff.initial_ms, 10);
        assert_eq!(config.retry_backoff.max_ms, 10_000);
        assert_eq!(config.throttle.min_delay_ms, 1_000);
        assert_eq!(config.throttle.medium_delay_ms, 5_000);
    }

    #[test]
    fn test_from_yaml_str_unknown_environment_is_prod() {
        let config = ClientConfig::from_yaml_str("api_key: k\nenvironment: qa\n").unwrap();
        assert_eq!(config.environment, Environment::Prod);

        let config = ClientConfig::from_yaml_str("api_key: k\nenvironment: STAGE\n").unwrap();
        assert_eq!(config.environment, Environment::Stage);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key: from-file\nretry_limit: 7").unwrap();

        let config = ClientConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.retry_limit, 7);
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let err = ClientConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_validate_requires_api_key() {
        assert!(matches!(
            ClientConfig::default().validate(),
            Err(Error::MissingApiKey)
        ));
        assert!(matches!(
            ClientConfig::new("   ").validate(),
            Err(Error::MissingApiKey)
        ));
        assert!(ClientConfig::new("key").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let err = ClientConfig::new("key").with_page_size(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "page_size"));

        let err = ClientConfig::new("key").with_retry_limit(0).validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "retry_limit")
        );
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let err = ClientConfig::new("key")
            .with_base_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_throttle_config_from_durations() {
        let throttle = ThrottleConfig::new(
            Duration::from_millis(5),
            Duration::from_millis(50),
            Duration::from_millis(500),
        );
        assert_eq!(throttle.min_delay_ms, 5);
        assert_eq!(throttle.medium_delay_ms, 50);
        assert_eq!(throttle.long_delay_ms, 500);
    }
}
