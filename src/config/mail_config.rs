//! Mail configuration parsing from environment variables.

use super::parse_var;
use anyhow::Result;
use std::env;

/// Outbound mail environment configuration
#[derive(Debug, Clone)]
pub struct MailEnvConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Domain of the per-symbol sender addresses
    pub from_domain: String,
    /// Log alerts instead of sending them
    pub dry_run: bool,
}

impl Default for MailEnvConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            from_domain: "localhost".to_string(),
            dry_run: false,
        }
    }
}

impl MailEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: parse_var("SMTP_PORT", defaults.smtp_port)?,
            from_domain: env::var("MAIL_FROM_DOMAIN").unwrap_or(defaults.from_domain),
            dry_run: parse_var("NOTIFY_DRY_RUN", defaults.dry_run)?,
        })
    }
}
