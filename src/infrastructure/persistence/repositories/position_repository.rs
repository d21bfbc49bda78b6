use crate::domain::repositories::PositionRepository;
use crate::domain::signals::channel::SignalChannel;
use crate::domain::tracking::position::{NotifyTimes, Position, PositionId, SignalSettings, UserId};
use crate::infrastructure::persistence::database::{
    Database, instant, parse_decimal, parse_optional_decimal,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::info;

const ORDERING: &str = "ORDER BY symbol ASC, entry_date ASC, shares ASC";

pub struct SqlitePositionRepository {
    database: Database,
}

impl SqlitePositionRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn map_row(row: &SqliteRow) -> Result<Position> {
        let time = |column: &str| -> Result<Option<DateTime<Utc>>> {
            row.try_get::<Option<i64>, _>(column)?
                .map(|secs| instant(column, secs))
                .transpose()
        };
        let threshold = |column: &str| -> Result<Option<Decimal>> {
            parse_optional_decimal(column, row.try_get(column)?)
        };

        Ok(Position {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            symbol: row.try_get("symbol")?,
            entry_date: row.try_get("entry_date")?,
            entry_price: parse_decimal("entry_price", row.try_get("entry_price")?)?,
            shares: row.try_get("shares")?,
            is_watched: row.try_get("is_watched")?,
            signals: SignalSettings {
                trailing_stop_percent: threshold("trailing_stop_percent")?,
                buy_stop_price: threshold("buy_stop_price")?,
                sell_stop_price: threshold("sell_stop_price")?,
                rise_percent: threshold("rise_percent")?,
                fall_percent: threshold("fall_percent")?,
                notify_trailing_stop: row.try_get("notify_trailing_stop")?,
                notify_buy_stop: row.try_get("notify_buy_stop")?,
                notify_sell_stop: row.try_get("notify_sell_stop")?,
                notify_rise: row.try_get("notify_rise")?,
                notify_fall: row.try_get("notify_fall")?,
                notify_bull_bear: row.try_get("notify_bull_bear")?,
            },
            last_notified: NotifyTimes {
                trailing_stop: time("last_notified_trailing_stop")?,
                buy_stop: time("last_notified_buy_stop")?,
                sell_stop: time("last_notified_sell_stop")?,
                rise: time("last_notified_rise")?,
                fall: time("last_notified_fall")?,
                bull_bear: time("last_notified_bull_bear")?,
            },
        })
    }

    fn map_rows(rows: Vec<SqliteRow>) -> Result<Vec<Position>> {
        rows.iter().map(Self::map_row).collect()
    }
}

fn text(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

#[async_trait]
impl PositionRepository for SqlitePositionRepository {
    async fn insert(&self, position: &Position) -> Result<PositionId> {
        let s = &position.signals;
        let result = sqlx::query(
            r#"
            INSERT INTO positions (
                user_id, symbol, entry_date, entry_price, shares, is_watched,
                trailing_stop_percent, buy_stop_price, sell_stop_price, rise_percent, fall_percent,
                notify_trailing_stop, notify_buy_stop, notify_sell_stop,
                notify_rise, notify_fall, notify_bull_bear
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(position.user_id)
        .bind(&position.symbol)
        .bind(position.entry_date)
        .bind(position.entry_price.to_string())
        .bind(position.shares)
        .bind(position.is_watched)
        .bind(text(s.trailing_stop_percent))
        .bind(text(s.buy_stop_price))
        .bind(text(s.sell_stop_price))
        .bind(text(s.rise_percent))
        .bind(text(s.fall_percent))
        .bind(s.notify_trailing_stop)
        .bind(s.notify_buy_stop)
        .bind(s.notify_sell_stop)
        .bind(s.notify_rise)
        .bind(s.notify_fall)
        .bind(s.notify_bull_bear)
        .execute(&self.database.pool)
        .await
        .with_context(|| format!("Failed to save {} position", position.symbol))?;

        let id = result.last_insert_rowid();
        info!("Persisted position {} ({}) for user {}", id, position.symbol, position.user_id);
        Ok(id)
    }

    async fn update(&self, position: &Position) -> Result<()> {
        let s = &position.signals;
        sqlx::query(
            r#"
            UPDATE positions SET
                symbol = ?, entry_date = ?, entry_price = ?, shares = ?, is_watched = ?,
                trailing_stop_percent = ?, buy_stop_price = ?, sell_stop_price = ?,
                rise_percent = ?, fall_percent = ?,
                notify_trailing_stop = ?, notify_buy_stop = ?, notify_sell_stop = ?,
                notify_rise = ?, notify_fall = ?, notify_bull_bear = ?
            WHERE id = ?
            "#,
        )
        .bind(&position.symbol)
        .bind(position.entry_date)
        .bind(position.entry_price.to_string())
        .bind(position.shares)
        .bind(position.is_watched)
        .bind(text(s.trailing_stop_percent))
        .bind(text(s.buy_stop_price))
        .bind(text(s.sell_stop_price))
        .bind(text(s.rise_percent))
        .bind(text(s.fall_percent))
        .bind(s.notify_trailing_stop)
        .bind(s.notify_buy_stop)
        .bind(s.notify_sell_stop)
        .bind(s.notify_rise)
        .bind(s.notify_fall)
        .bind(s.notify_bull_bear)
        .bind(position.id)
        .execute(&self.database.pool)
        .await
        .with_context(|| format!("Failed to update position {}", position.id))?;

        Ok(())
    }

    async fn delete(&self, id: PositionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM positions WHERE id = ?")
            .bind(id)
            .execute(&self.database.pool)
            .await
            .with_context(|| format!("Failed to delete position {}", id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: PositionId) -> Result<Option<Position>> {
        let row = sqlx::query("SELECT * FROM positions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.database.pool)
            .await
            .with_context(|| format!("Failed to load position {}", id))?;
        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Position>> {
        let sql = format!("SELECT * FROM positions WHERE user_id = ? {}", ORDERING);
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.database.pool)
            .await
            .with_context(|| format!("Failed to load positions of user {}", user_id))?;
        Self::map_rows(rows)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Vec<Position>> {
        let sql = format!("SELECT * FROM positions WHERE symbol = ? {}", ORDERING);
        let rows = sqlx::query(&sql)
            .bind(symbol)
            .fetch_all(&self.database.pool)
            .await
            .with_context(|| format!("Failed to load {} positions", symbol))?;
        Self::map_rows(rows)
    }

    async fn find_all(&self) -> Result<Vec<Position>> {
        let sql = format!("SELECT * FROM positions {}", ORDERING);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.database.pool)
            .await
            .context("Failed to load positions")?;
        Self::map_rows(rows)
    }

    async fn tracked_symbols(&self) -> Result<Vec<String>> {
        let symbols: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT symbol FROM positions ORDER BY symbol")
                .fetch_all(&self.database.pool)
                .await
                .context("Failed to load tracked symbols")?;
        Ok(symbols)
    }

    async fn min_entry_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            sqlx::query_scalar("SELECT MIN(entry_date) FROM positions WHERE symbol = ?")
                .bind(symbol)
                .fetch_one(&self.database.pool)
                .await
                .context("Failed to load earliest entry date")?;
        Ok(date)
    }

    async fn mark_notified(
        &self,
        id: PositionId,
        channel: SignalChannel,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE positions SET {} = ? WHERE id = ?",
            channel.last_notified_column()
        );
        sqlx::query(&sql)
            .bind(at.timestamp())
            .bind(id)
            .execute(&self.database.pool)
            .await
            .with_context(|| format!("Failed to record {} delivery for position {}", channel, id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::UserRepository;
    use crate::domain::tracking::user::User;
    use crate::infrastructure::persistence::repositories::SqliteUserRepository;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    async fn setup() -> (SqlitePositionRepository, UserId) {
        let db = Database::in_memory().await.unwrap();
        let users = SqliteUserRepository::new(db.clone());
        let user_id = users
            .insert(&User::new("Test User", "test@example.org", Duration::hours(1)))
            .await
            .unwrap();
        (SqlitePositionRepository::new(db), user_id)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_with_thresholds() {
        let (repo, user_id) = setup().await;
        let position = Position::new(user_id, "MSFT", date("2013-06-03"), dec!(35.10), -20)
            .with_signals(SignalSettings {
                trailing_stop_percent: Some(dec!(12.5)),
                sell_stop_price: Some(dec!(40.00)),
                notify_trailing_stop: true,
                notify_bull_bear: true,
                ..Default::default()
            });

        let id = repo.insert(&position).await.unwrap();
        let stored = repo.find(id).await.unwrap().unwrap();
        assert_eq!(stored, Position { id, ..position });
    }

    #[tokio::test]
    async fn test_listing_order_and_symbols() {
        let (repo, user_id) = setup().await;
        for (symbol, entry, shares) in [
            ("MSFT", "2013-06-03", 10),
            ("AAPL", "2013-07-01", 5),
            ("AAPL", "2013-07-01", -5),
            ("AAPL", "2012-01-03", 0),
        ] {
            repo.insert(&Position::new(user_id, symbol, date(entry), dec!(10), shares))
                .await
                .unwrap();
        }

        let listed: Vec<(String, i64)> = repo
            .find_by_user(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.symbol, p.shares))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("AAPL".to_string(), 0),
                ("AAPL".to_string(), -5),
                ("AAPL".to_string(), 5),
                ("MSFT".to_string(), 10),
            ]
        );
        assert_eq!(repo.tracked_symbols().await.unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(repo.min_entry_date("AAPL").await.unwrap(), Some(date("2012-01-03")));
        assert_eq!(repo.min_entry_date("GOOG").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mark_notified_touches_one_channel() {
        let (repo, user_id) = setup().await;
        let id = repo
            .insert(&Position::new(user_id, "MSFT", date("2013-06-03"), dec!(35), 10))
            .await
            .unwrap();
        let at = Utc.with_ymd_and_hms(2014, 1, 7, 15, 5, 0).unwrap();

        repo.mark_notified(id, SignalChannel::SellStop, at).await.unwrap();

        let stored = repo.find(id).await.unwrap().unwrap();
        assert_eq!(stored.last_notified.sell_stop, Some(at));
        assert_eq!(stored.last_notified.buy_stop, None);
        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
    }
}
