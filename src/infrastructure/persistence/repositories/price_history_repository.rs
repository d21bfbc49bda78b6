use crate::domain::market::price::{CloseExtrema, PricePoint};
use crate::domain::repositories::PriceHistoryRepository;
use crate::infrastructure::persistence::database::{Database, parse_decimal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::debug;

pub struct SqlitePriceHistoryRepository {
    database: Database,
}

impl SqlitePriceHistoryRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn map_row(row: &SqliteRow) -> Result<PricePoint> {
        Ok(PricePoint {
            symbol: row.try_get("symbol")?,
            date: row.try_get("date")?,
            trade_day_index: row.try_get("trade_day_index")?,
            open: parse_decimal("open", row.try_get("open")?)?,
            close: parse_decimal("close", row.try_get("close")?)?,
            high: parse_decimal("high", row.try_get("high")?)?,
            low: parse_decimal("low", row.try_get("low")?)?,
            volume: row.try_get("volume")?,
        })
    }
}

#[async_trait]
impl PriceHistoryRepository for SqlitePriceHistoryRepository {
    async fn find_last(&self, symbol: &str) -> Result<Option<PricePoint>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM price_history
            WHERE symbol = ?
            ORDER BY trade_day_index DESC
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.database.pool)
        .await
        .context("Failed to load last price point")?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_first_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        let first: Option<NaiveDate> =
            sqlx::query_scalar("SELECT MIN(date) FROM price_history WHERE symbol = ?")
                .bind(symbol)
                .fetch_one(&self.database.pool)
                .await
                .context("Failed to load first history date")?;
        Ok(first)
    }

    async fn insert_ignore(&self, points: &[PricePoint]) -> Result<u64> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .database
            .pool
            .begin()
            .await
            .context("Failed to begin history transaction")?;

        let mut written = 0;
        for point in points {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO price_history
                    (symbol, date, trade_day_index, open, close, high, low, volume)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&point.symbol)
            .bind(point.date)
            .bind(point.trade_day_index)
            .bind(point.open.to_string())
            .bind(point.close.to_string())
            .bind(point.high.to_string())
            .bind(point.low.to_string())
            .bind(point.volume)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert {} bar for {}", point.symbol, point.date))?;
            written += result.rows_affected();
        }

        tx.commit()
            .await
            .context("Failed to commit history transaction")?;

        debug!("Inserted {} of {} price points", written, points.len());
        Ok(written)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let rows = sqlx::query("SELECT * FROM price_history WHERE symbol = ? ORDER BY trade_day_index ASC")
            .bind(symbol)
            .fetch_all(&self.database.pool)
            .await
            .context("Failed to load price history")?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn close_extrema_since(&self, symbol: &str, since: NaiveDate) -> Result<Option<CloseExtrema>> {
        // Closes are TEXT, so order numerically and return the stored text
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT close FROM price_history
                 WHERE symbol = ?1 AND date >= ?2
                 ORDER BY CAST(close AS REAL) ASC LIMIT 1) AS lowest,
                (SELECT close FROM price_history
                 WHERE symbol = ?1 AND date >= ?2
                 ORDER BY CAST(close AS REAL) DESC LIMIT 1) AS highest
            "#,
        )
        .bind(symbol)
        .bind(since)
        .fetch_one(&self.database.pool)
        .await
        .context("Failed to load close extrema")?;

        let lowest: Option<String> = row.try_get("lowest")?;
        let highest: Option<String> = row.try_get("highest")?;
        match (lowest, highest) {
            (Some(lowest), Some(highest)) => Ok(Some(CloseExtrema {
                lowest: parse_decimal("close", &lowest)?,
                highest: parse_decimal("close", &highest)?,
            })),
            _ => Ok(None),
        }
    }

    async fn delete_history(&self, symbol: &str) -> Result<u64> {
        let mut tx = self
            .database
            .pool
            .begin()
            .await
            .context("Failed to begin delete transaction")?;

        sqlx::query("DELETE FROM trends WHERE symbol = ?")
            .bind(symbol)
            .execute(&mut *tx)
            .await
            .context("Failed to delete trends")?;
        let result = sqlx::query("DELETE FROM price_history WHERE symbol = ?")
            .bind(symbol)
            .execute(&mut *tx)
            .await
            .context("Failed to delete price history")?;

        tx.commit().await.context("Failed to commit delete transaction")?;
        Ok(result.rows_affected())
    }
}
