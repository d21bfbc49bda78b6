//! Position Tracker Service
//!
//! Owns users and their positions, and assembles the market data a position
//! is evaluated against.
//!
//! # Reindexing
//!
//! Trade-day indices are numbered from the first stored bar. When a position
//! lowers the earliest entry date of its symbol and the history it needs
//! starts before the stored history, the symbol's history and trends are
//! dropped and the next backfill refetches from the new start. Positions
//! dated on or after the symbol's earliest entry never trigger a reindex.

use crate::domain::errors::ValidationError;
use crate::domain::market::calendar::{AsOf, history_start};
use crate::domain::market::price::{TrendPoint, normalize_symbol};
use crate::domain::repositories::{
    HourlyQuoteRepository, PositionRepository, PriceHistoryRepository, TrendRepository,
    UserRepository,
};
use crate::domain::signals::evaluator::{PositionStats, SignalInputs, evaluate};
use crate::domain::tracking::position::{Position, PositionId, UserId};
use crate::domain::tracking::user::User;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Slack for weekends and holidays when deciding whether stored history
/// reaches back far enough.
const HISTORY_START_SLACK_DAYS: i64 = 7;

/// One row of a user's position listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDetail {
    pub position: Position,
    /// Cached price for the current bucket, if any
    pub current_price: Option<Decimal>,
    /// N1
    pub latest_trend: Option<TrendPoint>,
    /// N2
    pub prior_trend: Option<TrendPoint>,
    pub stats: Option<PositionStats>,
}

pub struct PositionTracker {
    users: Arc<dyn UserRepository>,
    positions: Arc<dyn PositionRepository>,
    history: Arc<dyn PriceHistoryRepository>,
    trends: Arc<dyn TrendRepository>,
    quotes: Arc<dyn HourlyQuoteRepository>,
}

impl PositionTracker {
    pub fn new(
        users: Arc<dyn UserRepository>,
        positions: Arc<dyn PositionRepository>,
        history: Arc<dyn PriceHistoryRepository>,
        trends: Arc<dyn TrendRepository>,
        quotes: Arc<dyn HourlyQuoteRepository>,
    ) -> Self {
        Self {
            users,
            positions,
            history,
            trends,
            quotes,
        }
    }

    pub async fn add_user(&self, user: &User) -> Result<UserId> {
        user.validate()?;
        self.users.insert(user).await
    }

    pub async fn user(&self, id: UserId) -> Result<Option<User>> {
        self.users.find(id).await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    /// Stores a new position. Channels with a threshold filled in are enabled.
    pub async fn add_position(&self, mut position: Position) -> Result<PositionId> {
        position.symbol = normalize_symbol(&position.symbol);
        position.signals.enable_configured();
        position.validate()?;

        if self.users.find(position.user_id).await?.is_none() {
            return Err(ValidationError::UnknownUser {
                user_id: position.user_id,
            }
            .into());
        }

        position.is_watched = position.shares == 0;
        let earliest = self.positions.min_entry_date(&position.symbol).await?;
        let id = self.positions.insert(&position).await?;
        self.ensure_history_covers(&position.symbol, position.entry_date, earliest)
            .await?;
        Ok(id)
    }

    /// Applies user edits. Notification times are never touched here.
    pub async fn update_position(&self, mut position: Position) -> Result<()> {
        position.symbol = normalize_symbol(&position.symbol);
        position.validate()?;

        let existing = self
            .positions
            .find(position.id)
            .await?
            .ok_or(ValidationError::UnknownPosition {
                position_id: position.id,
            })?;

        position.is_watched = position.shares == 0;
        let earliest = self.positions.min_entry_date(&position.symbol).await?;
        self.positions.update(&position).await?;
        if position.entry_date < existing.entry_date || position.symbol != existing.symbol {
            self.ensure_history_covers(&position.symbol, position.entry_date, earliest)
                .await?;
        }
        Ok(())
    }

    pub async fn remove_position(&self, id: PositionId) -> Result<bool> {
        let removed = self.positions.delete(id).await?;
        if removed {
            info!("Removed position {}", id);
        }
        Ok(removed)
    }

    pub async fn position(&self, id: PositionId) -> Result<Option<Position>> {
        self.positions.find(id).await
    }

    pub async fn positions_for_user(&self, user_id: UserId) -> Result<Vec<Position>> {
        self.positions.find_by_user(user_id).await
    }

    pub async fn positions_for_symbol(&self, symbol: &str) -> Result<Vec<Position>> {
        self.positions.find_by_symbol(&normalize_symbol(symbol)).await
    }

    pub async fn all_positions(&self) -> Result<Vec<Position>> {
        self.positions.find_all().await
    }

    pub async fn tracked_symbols(&self) -> Result<Vec<String>> {
        self.positions.tracked_symbols().await
    }

    /// Drops stored history that starts too late for `entry_date`.
    /// `earliest_entry` is the symbol's earliest entry date before this
    /// change; history was already fetched for it. Returns whether a reindex
    /// was scheduled.
    async fn ensure_history_covers(
        &self,
        symbol: &str,
        entry_date: NaiveDate,
        earliest_entry: Option<NaiveDate>,
    ) -> Result<bool> {
        if earliest_entry.is_some_and(|earliest| entry_date >= earliest) {
            return Ok(false);
        }
        let Some(first) = self.history.find_first_date(symbol).await? else {
            return Ok(false);
        };

        let needed = history_start(entry_date) + Duration::days(HISTORY_START_SLACK_DAYS);
        if first <= needed {
            return Ok(false);
        }

        warn!(
            "{}: stored history starts {} but {} is needed, reindexing",
            symbol, first, needed
        );
        self.history
            .delete_history(symbol)
            .await
            .with_context(|| format!("Failed to reset history of {}", symbol))?;
        Ok(true)
    }

    /// Market data for evaluating `position` at `current_price`.
    pub async fn signal_inputs(&self, position: &Position, current_price: Decimal) -> Result<SignalInputs> {
        let extrema = self
            .history
            .close_extrema_since(&position.symbol, position.entry_date)
            .await?;
        let last = self.history.find_last(&position.symbol).await?;
        let (latest, prior) = self.recent_trends(&position.symbol).await?;

        Ok(SignalInputs {
            current_price,
            extrema,
            previous_close: last.map(|p| p.close),
            latest_sma_percent: latest.as_ref().map(|t| t.sma_percent),
            prior_sma_percent: prior.as_ref().map(|t| t.sma_percent),
        })
    }

    /// N1 and N2 trend rows; N2 only when it is the trade day right before N1.
    async fn recent_trends(&self, symbol: &str) -> Result<(Option<TrendPoint>, Option<TrendPoint>)> {
        let mut recent = self.trends.find_recent(symbol, 2).await?.into_iter();
        let latest = recent.next();
        let prior = recent.next().filter(|p| {
            latest
                .as_ref()
                .is_some_and(|l| p.trade_day_index == l.trade_day_index - 1)
        });
        Ok((latest, prior))
    }

    /// Position listing with cached prices, trends and derived figures.
    pub async fn details(&self, user_id: UserId, as_of: &AsOf) -> Result<Vec<PositionDetail>> {
        let positions = self.positions.find_by_user(user_id).await?;
        let mut details = Vec::with_capacity(positions.len());

        for position in positions {
            let current_price = self
                .quotes
                .find(&position.symbol, as_of.quote_bucket)
                .await?
                .map(|q| q.price);
            let (latest_trend, prior_trend) = self.recent_trends(&position.symbol).await?;
            let stats = match current_price {
                Some(price) => {
                    let inputs = self.signal_inputs(&position, price).await?;
                    Some(evaluate(&position, &inputs).stats)
                }
                None => None,
            };

            details.push(PositionDetail {
                position,
                current_price,
                latest_trend,
                prior_trend,
                stats,
            });
        }

        Ok(details)
    }
}
