//! Configuration module for stockwatcher.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Store, Provider, Mail, and Watch.

mod mail_config;
mod provider_config;
mod store_config;
mod watch_config;

pub use mail_config::MailEnvConfig;
pub use provider_config::ProviderEnvConfig;
pub use store_config::StoreEnvConfig;
pub use watch_config::WatchEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration, one section per concern.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub store: StoreEnvConfig,
    pub provider: ProviderEnvConfig,
    pub mail: MailEnvConfig,
    pub watch: WatchEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            store: StoreEnvConfig::from_env(),
            provider: ProviderEnvConfig::from_env().context("Failed to load provider config")?,
            mail: MailEnvConfig::from_env().context("Failed to load mail config")?,
            watch: WatchEnvConfig::from_env().context("Failed to load watch config")?,
        })
    }
}

/// Reads `key`, falling back to `default` when unset.
pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<T>()
        .context(format!("Failed to parse {}", key))
}
