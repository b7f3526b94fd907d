//! Client configuration, loaded from env.

use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::breaker::BreakerConfig;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SHARDTALK_API_URL
    pub base_url: String,
    /// CLIENT_TIMEOUT_SECS; bounds every call, timeouts count as breaker failures
    pub timeout: Duration,
    /// BREAKER_FAILURE_THRESHOLD, BREAKER_COOLDOWN_SECS
    pub breaker: BreakerConfig,
    /// RETRY_MAX_ATTEMPTS, RETRY_BASE_DELAY_MS
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            breaker: BreakerConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Load from environment variables, falling back to reference values.
    pub fn load() -> Result<Self> {
        let base_url =
            env::var("SHARDTALK_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let timeout_secs = parse_env("CLIENT_TIMEOUT_SECS", 10u64)?;
        let failure_threshold = parse_env("BREAKER_FAILURE_THRESHOLD", 3u32)?;
        let cooldown_secs = parse_env("BREAKER_COOLDOWN_SECS", 60u64)?;
        let max_attempts = parse_env("RETRY_MAX_ATTEMPTS", 3u32)?;
        let base_delay_ms = parse_env("RETRY_BASE_DELAY_MS", 1000u64)?;

        let config = Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            breaker: BreakerConfig {
                failure_threshold,
                cooldown: Duration::from_secs(cooldown_secs),
            },
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(base_delay_ms)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.base_url).is_err() {
            anyhow::bail!("SHARDTALK_API_URL is not a valid URL: {}", self.base_url);
        }
        if self.timeout.is_zero() {
            anyhow::bail!("CLIENT_TIMEOUT_SECS must be greater than 0");
        }
        if self.breaker.failure_threshold == 0 {
            anyhow::bail!("BREAKER_FAILURE_THRESHOLD must be greater than 0");
        }
        Ok(())
    }
}

/// `default` when `key` is unset or empty; an unparseable value is an error.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: {}", key, raw)),
        _ => Ok(default),
    }
}
