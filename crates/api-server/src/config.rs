use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Runtime settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Reported as `version` in every response envelope.
    pub default_version: String,
    pub port: u16,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or empty keys take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let timeout_secs: u64 = var("UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be at least 1 second");
        }

        Ok(Self {
            api_key: var("ALPHAVANTAGE_API_KEY", "demo"),
            base_url: var("ALPHAVANTAGE_BASE_URL", alphavantage_client::DEFAULT_BASE_URL),
            default_version: var("API_DEFAULT_VERSION", "1.0"),
            port: var("PORT", "8080")
                .parse()
                .context("PORT must be a valid port number")?,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: "demo".to_string(),
            base_url: alphavantage_client::DEFAULT_BASE_URL.to_string(),
            default_version: "1.0".to_string(),
            port: 8080,
            upstream_timeout: Duration::from_secs(30),
        }
    }
}
