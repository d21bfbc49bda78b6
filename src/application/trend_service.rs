use crate::domain::repositories::{PriceHistoryRepository, TrendRepository};
use crate::domain::signals::trend::compute_trends;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Recomputes a symbol's moving averages from its stored history.
pub struct TrendService {
    history: Arc<dyn PriceHistoryRepository>,
    trends: Arc<dyn TrendRepository>,
}

impl TrendService {
    pub fn new(history: Arc<dyn PriceHistoryRepository>, trends: Arc<dyn TrendRepository>) -> Self {
        Self { history, trends }
    }

    /// Full recompute-and-replace. Returns the number of trend rows stored.
    pub async fn record_trends(&self, symbol: &str) -> Result<usize> {
        let points = self
            .history
            .find_by_symbol(symbol)
            .await
            .with_context(|| format!("Failed to load history of {}", symbol))?;

        let trends = compute_trends(&points);
        self.trends
            .replace_all(symbol, &trends)
            .await
            .with_context(|| format!("Failed to store trends of {}", symbol))?;

        if let Some(last) = trends.last() {
            info!(
                "{}: {} trend rows, latest avg50={:.2} avg200={:.2} sma={:.2}%",
                symbol,
                trends.len(),
                last.avg50,
                last.avg200,
                last.sma_percent
            );
        } else {
            info!(
                "{}: {} bars stored, not enough for a 200 day average",
                symbol,
                points.len()
            );
        }
        Ok(trends.len())
    }
}
