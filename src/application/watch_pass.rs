//! Watch Pass
//!
//! One scheduled batch run over every tracked symbol:
//!
//! 1. Fetch current prices (spawned, runs while history is refreshed)
//! 2. Backfill history and recompute trends per symbol
//! 3. Evaluate every position and dispatch fired signals
//!
//! A history or trend failure only skips that symbol's refresh, and a store
//! failure while evaluating a position only skips that position. A current
//! price failure fails the pass, since no signal can be evaluated without it.

use crate::application::alert_dispatcher::{AlertDispatcher, DispatchSummary};
use crate::application::history_service::HistoryService;
use crate::application::position_tracker::PositionTracker;
use crate::application::quote_cache::QuoteCache;
use crate::application::trend_service::TrendService;
use crate::domain::market::calendar::AsOf;
use crate::domain::signals::evaluator::evaluate;
use crate::domain::tracking::position::{Position, PositionId, UserId};
use crate::domain::tracking::user::User;
use anyhow::{Context, Result, anyhow};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub symbols: usize,
    pub bars_recorded: u64,
    pub trend_rows: usize,
    /// Symbols whose history or trend refresh failed
    pub failed_symbols: Vec<String>,
    pub positions_evaluated: usize,
    /// Positions whose evaluation or alert bookkeeping failed
    pub failed_positions: Vec<PositionId>,
    pub signals_fired: usize,
    pub alerts: DispatchSummary,
}

pub struct WatchPass {
    history: Arc<HistoryService>,
    trends: Arc<TrendService>,
    quotes: Arc<QuoteCache>,
    tracker: Arc<PositionTracker>,
    dispatcher: Arc<AlertDispatcher>,
}

impl WatchPass {
    pub fn new(
        history: Arc<HistoryService>,
        trends: Arc<TrendService>,
        quotes: Arc<QuoteCache>,
        tracker: Arc<PositionTracker>,
        dispatcher: Arc<AlertDispatcher>,
    ) -> Self {
        Self {
            history,
            trends,
            quotes,
            tracker,
            dispatcher,
        }
    }

    /// Runs one pass. `force` bypasses the quote cache.
    pub async fn run(&self, as_of: AsOf, force: bool) -> Result<PassReport> {
        let symbols = self.tracker.tracked_symbols().await?;
        let mut report = PassReport {
            symbols: symbols.len(),
            ..Default::default()
        };
        if symbols.is_empty() {
            info!("No tracked symbols, nothing to do");
            return Ok(report);
        }
        info!(
            "Watch pass at {} (last trading day {}) over {} symbols",
            as_of.now,
            as_of.last_trading_date,
            symbols.len()
        );

        let quote_task = {
            let quotes = self.quotes.clone();
            let symbols = symbols.clone();
            tokio::spawn(async move { quotes.get_current_prices(&symbols, &as_of, force).await })
        };

        for symbol in &symbols {
            match self.refresh_symbol(symbol, &as_of).await {
                Ok((bars, trends)) => {
                    report.bars_recorded += bars;
                    report.trend_rows += trends;
                }
                Err(e) => {
                    error!("{}: refresh failed: {:#}", symbol, e);
                    report.failed_symbols.push(symbol.clone());
                }
            }
        }

        let prices = quote_task
            .await
            .map_err(|e| anyhow!("Quote fetch task failed: {}", e))?
            .context("Current prices unavailable, aborting pass")?;

        let mut users: HashMap<UserId, Option<User>> = HashMap::new();
        for mut position in self.tracker.all_positions().await? {
            let Some(&price) = prices.get(&position.symbol) else {
                warn!("{}: no current price, skipping position {}", position.symbol, position.id);
                continue;
            };

            let user = match users.get(&position.user_id) {
                Some(user) => user.clone(),
                None => match self.tracker.user(position.user_id).await {
                    Ok(user) => {
                        users.insert(position.user_id, user.clone());
                        user
                    }
                    Err(e) => {
                        error!("Failed to load owner of position {}: {:#}", position.id, e);
                        report.failed_positions.push(position.id);
                        continue;
                    }
                },
            };
            let Some(user) = user else {
                warn!("Position {} has no owner {}", position.id, position.user_id);
                continue;
            };

            match self.check_position(&mut position, &user, price, &as_of).await {
                Ok((fired, summary)) => {
                    report.positions_evaluated += 1;
                    report.signals_fired += fired;
                    report.alerts.merge(summary);
                }
                Err(e) => {
                    error!(
                        "{}: position {} not evaluated: {:#}",
                        position.symbol, position.id, e
                    );
                    report.failed_positions.push(position.id);
                }
            }
        }

        info!(
            "Watch pass done: {} bars, {} positions, {} fired, {} sent, {} cooling, {} failed",
            report.bars_recorded,
            report.positions_evaluated,
            report.signals_fired,
            report.alerts.delivered,
            report.alerts.suppressed,
            report.alerts.failed
        );
        Ok(report)
    }

    /// Evaluates one position and dispatches what fired.
    /// Returns the number of fired signals and the delivery outcome.
    async fn check_position(
        &self,
        position: &mut Position,
        user: &User,
        price: Decimal,
        as_of: &AsOf,
    ) -> Result<(usize, DispatchSummary)> {
        let inputs = self
            .tracker
            .signal_inputs(position, price)
            .await
            .with_context(|| format!("Failed to load market data for {}", position.symbol))?;
        let evaluation = evaluate(position, &inputs);
        let summary = self
            .dispatcher
            .dispatch(position, user, &evaluation.fired, as_of)
            .await?;
        Ok((evaluation.fired.len(), summary))
    }

    async fn refresh_symbol(&self, symbol: &str, as_of: &AsOf) -> Result<(u64, usize)> {
        let bars = self.history.record_history(symbol, as_of).await?;
        let trends = self.trends.record_trends(symbol).await?;
        Ok((bars, trends))
    }
}
