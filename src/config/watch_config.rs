//! Watch pass configuration parsing from environment variables.

use super::parse_var;
use anyhow::{Result, anyhow, bail};
use chrono::Duration;
use chrono_tz::Tz;
use std::env;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Watch pass environment configuration
#[derive(Debug, Clone)]
pub struct WatchEnvConfig {
    /// Width of a quote cache bucket
    pub quote_bucket: Duration,
    /// Timezone that defines the exchange's calendar day
    pub exchange_timezone: Tz,
}

impl Default for WatchEnvConfig {
    fn default() -> Self {
        Self {
            quote_bucket: Duration::minutes(60),
            exchange_timezone: chrono_tz::America::New_York,
        }
    }
}

impl WatchEnvConfig {
    pub fn from_env() -> Result<Self> {
        let bucket_minutes = parse_var("QUOTE_BUCKET_MINUTES", 60i64)?;
        let timezone =
            env::var("EXCHANGE_TIMEZONE").unwrap_or_else(|_| "America/New_York".to_string());
        Self::new(bucket_minutes, &timezone)
    }

    pub fn new(bucket_minutes: i64, timezone: &str) -> Result<Self> {
        if bucket_minutes <= 0 || MINUTES_PER_DAY % bucket_minutes != 0 {
            bail!(
                "QUOTE_BUCKET_MINUTES must evenly divide a day, got {}",
                bucket_minutes
            );
        }
        let exchange_timezone = timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid EXCHANGE_TIMEZONE {:?}: {}", timezone, e))?;

        Ok(Self {
            quote_bucket: Duration::minutes(bucket_minutes),
            exchange_timezone,
        })
    }
}
