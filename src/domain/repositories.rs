//! Repository Pattern Abstractions
//!
//! Storage seams used by the engine. Price history, trends and hourly quotes
//! are keyed by symbol only and shared by every position on that symbol;
//! positions and users are owned records.
//!
//! The SQLite implementations live in `infrastructure::persistence`.

use crate::domain::market::price::{CloseExtrema, HourlyQuote, PricePoint, TrendPoint};
use crate::domain::signals::channel::SignalChannel;
use crate::domain::tracking::position::{Position, PositionId, UserId};
use crate::domain::tracking::user::User;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Daily bars per symbol, indexed by trade day
#[async_trait]
pub trait PriceHistoryRepository: Send + Sync {
    /// Most recently recorded bar (highest trade-day index)
    async fn find_last(&self, symbol: &str) -> Result<Option<PricePoint>>;

    /// Date of the oldest recorded bar
    async fn find_first_date(&self, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Inserts all points in one transaction, skipping (symbol, date) pairs
    /// already present. Returns the number of rows written.
    async fn insert_ignore(&self, points: &[PricePoint]) -> Result<u64>;

    /// All bars for a symbol in trade-day order
    async fn find_by_symbol(&self, symbol: &str) -> Result<Vec<PricePoint>>;

    /// Lowest and highest close on or after `since`
    async fn close_extrema_since(&self, symbol: &str, since: NaiveDate) -> Result<Option<CloseExtrema>>;

    /// Removes the symbol's history together with its trend rows
    async fn delete_history(&self, symbol: &str) -> Result<u64>;
}

/// Moving-average rows derived from price history
#[async_trait]
pub trait TrendRepository: Send + Sync {
    /// Replaces every trend row of the symbol in one transaction
    async fn replace_all(&self, symbol: &str, trends: &[TrendPoint]) -> Result<()>;

    /// Most recent rows first
    async fn find_recent(&self, symbol: &str, limit: usize) -> Result<Vec<TrendPoint>>;
}

/// Current-price cache keyed by (symbol, bucket)
#[async_trait]
pub trait HourlyQuoteRepository: Send + Sync {
    async fn find(&self, symbol: &str, bucket: DateTime<Utc>) -> Result<Option<HourlyQuote>>;

    /// Inserts or replaces the row for the quote's bucket
    async fn upsert(&self, quote: &HourlyQuote) -> Result<()>;
}

#[async_trait]
pub trait PositionRepository: Send + Sync {
    async fn insert(&self, position: &Position) -> Result<PositionId>;

    /// Updates the user-editable fields; notification times are left alone
    async fn update(&self, position: &Position) -> Result<()>;

    async fn delete(&self, id: PositionId) -> Result<bool>;

    async fn find(&self, id: PositionId) -> Result<Option<Position>>;

    /// Ordered by symbol, entry date, shares
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Position>>;

    async fn find_by_symbol(&self, symbol: &str) -> Result<Vec<Position>>;

    async fn find_all(&self) -> Result<Vec<Position>>;

    /// Distinct symbols referenced by any position
    async fn tracked_symbols(&self) -> Result<Vec<String>>;

    async fn min_entry_date(&self, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Persists a successful delivery for one channel
    async fn mark_notified(
        &self,
        id: PositionId,
        channel: SignalChannel,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<UserId>;

    async fn find(&self, id: UserId) -> Result<Option<User>>;

    /// Looks the user up by any of their addresses
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}
