use crate::domain::market::price::HourlyQuote;
use crate::domain::repositories::HourlyQuoteRepository;
use crate::infrastructure::persistence::database::{Database, instant, parse_decimal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct SqliteHourlyQuoteRepository {
    database: Database,
}

impl SqliteHourlyQuoteRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl HourlyQuoteRepository for SqliteHourlyQuoteRepository {
    async fn find(&self, symbol: &str, bucket: DateTime<Utc>) -> Result<Option<HourlyQuote>> {
        let row = sqlx::query_as::<_, (String, i64, String, i64)>(
            r#"
            SELECT symbol, bucket, price, fetched_at
            FROM hourly_quotes
            WHERE symbol = ? AND bucket = ?
            "#,
        )
        .bind(symbol)
        .bind(bucket.timestamp())
        .fetch_optional(&self.database.pool)
        .await
        .context("Failed to load hourly quote")?;

        match row {
            Some((symbol, bucket, price, fetched_at)) => Ok(Some(HourlyQuote {
                symbol,
                bucket: instant("bucket", bucket)?,
                price: parse_decimal("price", &price)?,
                fetched_at: instant("fetched_at", fetched_at)?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert(&self, quote: &HourlyQuote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hourly_quotes (symbol, bucket, price, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(symbol, bucket) DO UPDATE SET
                price = excluded.price,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&quote.symbol)
        .bind(quote.bucket.timestamp())
        .bind(quote.price.to_string())
        .bind(quote.fetched_at.timestamp())
        .execute(&self.database.pool)
        .await
        .context("Failed to save hourly quote")?;

        Ok(())
    }
}
