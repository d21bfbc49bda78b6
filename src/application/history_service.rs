//! History Backfill Service
//!
//! Keeps each symbol's daily price series up to the most recent completed
//! trading day. Every run only asks the provider for days after the last
//! stored bar, and inserts ignore dates already present, so repeating a run
//! (or resuming after a failed one) never duplicates rows.

use crate::domain::market::calendar::{AsOf, history_start};
use crate::domain::market::price::{HistoricalBar, PricePoint};
use crate::domain::ports::QuoteProvider;
use crate::domain::repositories::{PositionRepository, PriceHistoryRepository};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info};

pub struct HistoryService {
    history: Arc<dyn PriceHistoryRepository>,
    positions: Arc<dyn PositionRepository>,
    provider: Arc<dyn QuoteProvider>,
}

impl HistoryService {
    pub fn new(
        history: Arc<dyn PriceHistoryRepository>,
        positions: Arc<dyn PositionRepository>,
        provider: Arc<dyn QuoteProvider>,
    ) -> Self {
        Self {
            history,
            positions,
            provider,
        }
    }

    /// Backfills missing bars for `symbol`. Returns the number of rows written.
    pub async fn record_history(&self, symbol: &str, as_of: &AsOf) -> Result<u64> {
        let last = self
            .history
            .find_last(symbol)
            .await
            .with_context(|| format!("Failed to read last bar of {}", symbol))?;

        let (after, last_index) = match &last {
            Some(point) if point.date >= as_of.last_trading_date => {
                debug!(
                    "{}: history current through {}, nothing to fetch",
                    symbol, point.date
                );
                return Ok(0);
            }
            Some(point) => (point.date, point.trade_day_index),
            None => {
                let earliest = self
                    .positions
                    .min_entry_date(symbol)
                    .await?
                    .unwrap_or(as_of.last_trading_date);
                (history_start(earliest), 0)
            }
        };

        let from = after + Duration::days(1);
        info!(
            "{}: fetching history {} ..= {}",
            symbol, from, as_of.last_trading_date
        );
        let bars = self
            .provider
            .fetch_history(symbol, from, as_of.last_trading_date)
            .await
            .with_context(|| format!("Failed to fetch history of {}", symbol))?;

        let points = index_bars(symbol, bars, after, as_of.last_trading_date, last_index);
        if points.is_empty() {
            info!("{}: provider returned no new bars", symbol);
            return Ok(0);
        }

        let written = self
            .history
            .insert_ignore(&points)
            .await
            .with_context(|| format!("Failed to record history of {}", symbol))?;
        info!(
            "{}: recorded {} bars, last trade day index {}",
            symbol,
            written,
            points.last().map(|p| p.trade_day_index).unwrap_or(last_index)
        );
        Ok(written)
    }

    /// Drops the symbol's history and trends so the next backfill starts over.
    pub async fn delete_history(&self, symbol: &str) -> Result<u64> {
        let deleted = self
            .history
            .delete_history(symbol)
            .await
            .with_context(|| format!("Failed to delete history of {}", symbol))?;
        info!("{}: deleted {} history rows", symbol, deleted);
        Ok(deleted)
    }
}

/// Orders bars by date, keeps those in `(after, until]` and numbers them
/// from `last_index + 1`.
fn index_bars(
    symbol: &str,
    mut bars: Vec<HistoricalBar>,
    after: NaiveDate,
    until: NaiveDate,
    last_index: i64,
) -> Vec<PricePoint> {
    bars.retain(|b| b.date > after && b.date <= until);
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| PricePoint::from_bar(symbol, last_index + 1 + i as i64, bar))
        .collect()
}
