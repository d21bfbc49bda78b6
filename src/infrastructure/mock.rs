use crate::domain::errors::{NotificationError, ProviderError};
use crate::domain::market::price::HistoricalBar;
use crate::domain::ports::{NotificationSink, QuoteProvider};
use crate::domain::signals::alert::AlertMessage;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Scripted quote provider for tests and offline runs.
#[derive(Clone, Default)]
pub struct MockQuoteProvider {
    prices: Arc<RwLock<HashMap<String, Decimal>>>,
    history: Arc<RwLock<HashMap<String, Vec<HistoricalBar>>>>,
    fail_current: Arc<AtomicBool>,
    fail_history: Arc<AtomicBool>,
    current_calls: Arc<AtomicUsize>,
    history_calls: Arc<AtomicUsize>,
    history_requests: Arc<RwLock<Vec<(String, NaiveDate, NaiveDate)>>>,
}

impl MockQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.write().await.insert(symbol.to_string(), price);
    }

    /// Makes `bars` available as the symbol's full history.
    pub async fn set_history(&self, symbol: &str, mut bars: Vec<HistoricalBar>) {
        bars.sort_by_key(|b| b.date);
        self.history.write().await.insert(symbol.to_string(), bars);
    }

    pub fn fail_current(&self, fail: bool) {
        self.fail_current.store(fail, Ordering::SeqCst);
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// (symbol, start, end) of every history request, oldest first
    pub async fn history_requests(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.history_requests.read().await.clone()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn fetch_current(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, ProviderError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(ProviderError::Status { status: 503 });
        }

        let prices = self.prices.read().await;
        let mut result = HashMap::new();
        for symbol in symbols {
            let price = prices.get(symbol).ok_or_else(|| ProviderError::InvalidData {
                symbol: symbol.clone(),
                reason: "no quote in response".to_string(),
            })?;
            result.insert(symbol.clone(), *price);
        }
        Ok(result)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history_requests
            .write()
            .await
            .push((symbol.to_string(), start, end));
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(ProviderError::Timeout { duration_secs: 30 });
        }

        let history = self.history.read().await;
        Ok(history
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Sink that keeps every delivered alert in memory.
#[derive(Clone, Default)]
pub struct RecordingNotificationSink {
    sent: Arc<RwLock<Vec<AlertMessage>>>,
    fail: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<AlertMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport {
                reason: "421 service not available".to_string(),
            });
        }

        info!("RecordingNotificationSink: {}", message.subject);
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_history_filters_range() {
        let provider = MockQuoteProvider::new();
        let day = |d| NaiveDate::from_ymd_opt(2014, 1, d).unwrap();
        let bar = |d| HistoricalBar {
            date: day(d),
            open: dec!(1),
            close: dec!(1),
            high: dec!(1),
            low: dec!(1),
            volume: 1,
        };
        provider.set_history("MSFT", vec![bar(6), bar(2), bar(3)]).await;

        let bars = provider.fetch_history("MSFT", day(3), day(6)).await.unwrap();
        assert_eq!(bars.iter().map(|b| b.date).collect::<Vec<_>>(), vec![day(3), day(6)]);
        assert_eq!(provider.history_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_current_missing_symbol_fails_whole_batch() {
        let provider = MockQuoteProvider::new();
        provider.set_price("MSFT", dec!(36.13)).await;

        let result = provider
            .fetch_current(&["MSFT".to_string(), "AAPL".to_string()])
            .await;
        assert!(result.is_err());
        assert_eq!(provider.current_calls(), 1);
    }
}
