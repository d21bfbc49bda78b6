use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::StoreEnvConfig;
use crate::domain::repositories::{
    HourlyQuoteRepository, PositionRepository, PriceHistoryRepository, TrendRepository,
    UserRepository,
};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteHourlyQuoteRepository, SqlitePositionRepository, SqlitePriceHistoryRepository,
    SqliteTrendRepository, SqliteUserRepository,
};

pub struct PersistenceHandle {
    pub db: Database,
    pub user_repository: Arc<dyn UserRepository>,
    pub position_repository: Arc<dyn PositionRepository>,
    pub history_repository: Arc<dyn PriceHistoryRepository>,
    pub trend_repository: Arc<dyn TrendRepository>,
    pub quote_repository: Arc<dyn HourlyQuoteRepository>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &StoreEnvConfig) -> Result<PersistenceHandle> {
        info!("Initializing Database at {}", config.database_url);

        let db = Database::new(&config.database_url)
            .await
            .context("Failed to initialize database")?;

        Ok(Self::from_database(db))
    }

    /// Wires the repositories over an already opened store.
    pub fn from_database(db: Database) -> PersistenceHandle {
        PersistenceHandle {
            user_repository: Arc::new(SqliteUserRepository::new(db.clone())),
            position_repository: Arc::new(SqlitePositionRepository::new(db.clone())),
            history_repository: Arc::new(SqlitePriceHistoryRepository::new(db.clone())),
            trend_repository: Arc::new(SqliteTrendRepository::new(db.clone())),
            quote_repository: Arc::new(SqliteHourlyQuoteRepository::new(db.clone())),
            db,
        }
    }
}
