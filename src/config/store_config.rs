//! Store configuration parsing from environment variables.

use std::env;

/// Local store configuration
#[derive(Debug, Clone)]
pub struct StoreEnvConfig {
    pub database_url: String,
}

impl Default for StoreEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://stocks.db".to_string(),
        }
    }
}

impl StoreEnvConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| Self::default().database_url),
        }
    }
}
