use crate::domain::market::price::TrendPoint;
use crate::domain::repositories::TrendRepository;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

pub struct SqliteTrendRepository {
    database: Database,
}

impl SqliteTrendRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn map_row(row: &SqliteRow) -> Result<TrendPoint> {
        Ok(TrendPoint {
            symbol: row.try_get("symbol")?,
            date: row.try_get("date")?,
            trade_day_index: row.try_get("trade_day_index")?,
            avg50: row.try_get("avg50")?,
            avg200: row.try_get("avg200")?,
            sma_percent: row.try_get("sma_percent")?,
        })
    }
}

#[async_trait]
impl TrendRepository for SqliteTrendRepository {
    async fn replace_all(&self, symbol: &str, trends: &[TrendPoint]) -> Result<()> {
        let mut tx = self
            .database
            .pool
            .begin()
            .await
            .context("Failed to begin trend transaction")?;

        sqlx::query("DELETE FROM trends WHERE symbol = ?")
            .bind(symbol)
            .execute(&mut *tx)
            .await
            .context("Failed to clear trends")?;

        for trend in trends {
            sqlx::query(
                r#"
                INSERT INTO trends (symbol, date, trade_day_index, avg50, avg200, sma_percent)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(symbol)
            .bind(trend.date)
            .bind(trend.trade_day_index)
            .bind(trend.avg50)
            .bind(trend.avg200)
            .bind(trend.sma_percent)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert trend for {} on {}", symbol, trend.date))?;
        }

        tx.commit().await.context("Failed to commit trend transaction")?;
        Ok(())
    }

    async fn find_recent(&self, symbol: &str, limit: usize) -> Result<Vec<TrendPoint>> {
        let rows = sqlx::query(
            "SELECT * FROM trends WHERE symbol = ? ORDER BY trade_day_index DESC LIMIT ?",
        )
        .bind(symbol)
        .bind(limit as i64)
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load recent trends")?;

        rows.iter().map(Self::map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trend(idx: i64, sma_percent: f64) -> TrendPoint {
        TrendPoint {
            symbol: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap() + chrono::Duration::days(idx),
            trade_day_index: idx,
            avg50: 100.0,
            avg200: 99.0,
            sma_percent,
        }
    }

    #[tokio::test]
    async fn test_replace_all_drops_previous_rows() {
        let repo = SqliteTrendRepository::new(Database::in_memory().await.unwrap());
        repo.replace_all("AAPL", &[trend(201, 1.0), trend(202, 2.0), trend(203, 3.0)])
            .await
            .unwrap();
        repo.replace_all("AAPL", &[trend(201, -1.0), trend(202, -2.0)])
            .await
            .unwrap();

        let recent = repo.find_recent("AAPL", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].trade_day_index, 202);
        assert_eq!(recent[0].sma_percent, -2.0);
        assert_eq!(recent[1].trade_day_index, 201);
    }
}
