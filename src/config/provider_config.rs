//! Quote provider configuration parsing from environment variables.
//!
//! Covers the endpoint, the datatable environment sent with every query, the
//! per-request timeout and retry budget, and the history window size.

use super::parse_var;
use anyhow::{Result, bail};
use std::env;

pub const DEFAULT_PROVIDER_URL: &str = "http://query.yahooapis.com/v1/public/yql";
pub const DEFAULT_DATATABLE_ENV: &str = "store://datatables.org/alltableswithkeys";

/// Quote provider environment configuration
#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub base_url: String,
    pub datatable_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Longest date range requested in one history query
    pub history_window_days: i64,
}

impl Default for ProviderEnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            datatable_env: DEFAULT_DATATABLE_ENV.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            history_window_days: 365,
        }
    }
}

impl ProviderEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            base_url: env::var("QUOTE_PROVIDER_URL").unwrap_or(defaults.base_url),
            datatable_env: env::var("QUOTE_PROVIDER_ENV").unwrap_or(defaults.datatable_env),
            timeout_secs: parse_var("PROVIDER_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_retries: parse_var("PROVIDER_MAX_RETRIES", defaults.max_retries)?,
            history_window_days: parse_var("HISTORY_WINDOW_DAYS", defaults.history_window_days)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("PROVIDER_TIMEOUT_SECS must be positive");
        }
        if self.history_window_days < 1 {
            bail!(
                "HISTORY_WINDOW_DAYS must be at least 1, got {}",
                self.history_window_days
            );
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid QUOTE_PROVIDER_URL {:?}: {}", self.base_url, e))?;
        Ok(())
    }
}
