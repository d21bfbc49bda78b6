use crate::domain::errors::{NotificationError, ProviderError};
use crate::domain::market::price::HistoricalBar;
use crate::domain::signals::alert::AlertMessage;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// External source of current quotes and daily history.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current price for every symbol, in one request. Fails as a whole.
    async fn fetch_current(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, ProviderError>;

    /// Daily bars with `start <= date <= end`, ascending by date.
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, ProviderError>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError>;
}
