use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared handle to the stock store
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Private in-memory store; one pinned connection so every query sees the same data.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Users and their addresses
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                cooldown_secs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS user_emails (
                user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                email TEXT NOT NULL UNIQUE,
                is_primary BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_user_emails_primary
            ON user_emails (user_id) WHERE is_primary = 1;
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create users tables")?;

        // 2. Positions (owned, shorted or watched)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                symbol TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                shares INTEGER NOT NULL,
                is_watched BOOLEAN NOT NULL DEFAULT 0,
                trailing_stop_percent TEXT,
                buy_stop_price TEXT,
                sell_stop_price TEXT,
                rise_percent TEXT,
                fall_percent TEXT,
                notify_trailing_stop BOOLEAN NOT NULL DEFAULT 0,
                notify_buy_stop BOOLEAN NOT NULL DEFAULT 0,
                notify_sell_stop BOOLEAN NOT NULL DEFAULT 0,
                notify_rise BOOLEAN NOT NULL DEFAULT 0,
                notify_fall BOOLEAN NOT NULL DEFAULT 0,
                notify_bull_bear BOOLEAN NOT NULL DEFAULT 0,
                last_notified_trailing_stop INTEGER,
                last_notified_buy_stop INTEGER,
                last_notified_sell_stop INTEGER,
                last_notified_rise INTEGER,
                last_notified_fall INTEGER,
                last_notified_bull_bear INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_positions_symbol ON positions (symbol);
            CREATE INDEX IF NOT EXISTS idx_positions_user ON positions (user_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create positions table")?;

        // 3. Daily price history
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                trade_day_index INTEGER NOT NULL,
                open TEXT NOT NULL,
                close TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date),
                UNIQUE (symbol, trade_day_index)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create price_history table")?;

        // 4. Moving averages derived from price history
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trends (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                trade_day_index INTEGER NOT NULL,
                avg50 REAL NOT NULL,
                avg200 REAL NOT NULL,
                sma_percent REAL NOT NULL,
                PRIMARY KEY (symbol, trade_day_index)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create trends table")?;

        // 5. Current-price cache
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hourly_quotes (
                symbol TEXT NOT NULL,
                bucket INTEGER NOT NULL,
                price TEXT NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (symbol, bucket)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create hourly_quotes table")?;

        info!("Database schema initialized.");
        Ok(())
    }
}

/// Parses a TEXT currency column.
pub(crate) fn parse_decimal(column: &str, value: &str) -> Result<rust_decimal::Decimal> {
    rust_decimal::Decimal::from_str(value)
        .with_context(|| format!("Malformed decimal in column {}: {:?}", column, value))
}

/// Parses a nullable TEXT currency column.
pub(crate) fn parse_optional_decimal(
    column: &str,
    value: Option<String>,
) -> Result<Option<rust_decimal::Decimal>> {
    value.map(|v| parse_decimal(column, &v)).transpose()
}

/// Converts a stored unix timestamp.
pub(crate) fn instant(column: &str, secs: i64) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(secs, 0)
        .with_context(|| format!("Out of range timestamp in column {}: {}", column, secs))
}
