use crate::domain::errors::ValidationError;
use crate::domain::market::price::is_valid_symbol;
use crate::domain::signals::channel::SignalChannel;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub type PositionId = i64;
pub type UserId = i64;

/// A trailing stop beyond 100% would put a long stop below zero.
pub const MAX_TRAILING_STOP_PERCENT: Decimal = dec!(100);
pub const MAX_MOVE_PERCENT: Decimal = dec!(1000);
pub const MAX_PRICE: Decimal = dec!(1000000);
/// Limit on the absolute share count.
pub const MAX_SHARES: i64 = 1_000_000_000;

fn check_at_most(field: &'static str, value: Decimal, max: Decimal) -> Result<(), ValidationError> {
    if value > max {
        return Err(ValidationError::AboveLimit { field, value, max });
    }
    Ok(())
}

/// Direction of a position, derived from the sign of its share count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
    Watch,
}

/// Per-position thresholds and the switches that enable each channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSettings {
    pub trailing_stop_percent: Option<Decimal>,
    pub buy_stop_price: Option<Decimal>,
    pub sell_stop_price: Option<Decimal>,
    pub rise_percent: Option<Decimal>,
    pub fall_percent: Option<Decimal>,
    pub notify_trailing_stop: bool,
    pub notify_buy_stop: bool,
    pub notify_sell_stop: bool,
    pub notify_rise: bool,
    pub notify_fall: bool,
    pub notify_bull_bear: bool,
}

impl SignalSettings {
    pub fn is_enabled(&self, channel: SignalChannel) -> bool {
        match channel {
            SignalChannel::TrailingStop => self.notify_trailing_stop,
            SignalChannel::BuyStop => self.notify_buy_stop,
            SignalChannel::SellStop => self.notify_sell_stop,
            SignalChannel::Rise => self.notify_rise,
            SignalChannel::Fall => self.notify_fall,
            SignalChannel::BullBear => self.notify_bull_bear,
        }
    }

    /// Turns on every channel whose threshold has been filled in.
    pub fn enable_configured(&mut self) {
        self.notify_trailing_stop |= self.trailing_stop_percent.is_some();
        self.notify_buy_stop |= self.buy_stop_price.is_some();
        self.notify_sell_stop |= self.sell_stop_price.is_some();
        self.notify_rise |= self.rise_percent.is_some();
        self.notify_fall |= self.fall_percent.is_some();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let percents = [
            ("trailing_stop_percent", self.trailing_stop_percent, MAX_TRAILING_STOP_PERCENT),
            ("rise_percent", self.rise_percent, MAX_MOVE_PERCENT),
            ("fall_percent", self.fall_percent, MAX_MOVE_PERCENT),
        ];
        for (field, value, max) in percents {
            if let Some(value) = value {
                if value.is_sign_negative() {
                    return Err(ValidationError::NegativePercent { field, value });
                }
                check_at_most(field, value, max)?;
            }
        }

        let prices = [
            ("buy_stop_price", self.buy_stop_price),
            ("sell_stop_price", self.sell_stop_price),
        ];
        for (field, value) in prices {
            if let Some(value) = value {
                if value <= Decimal::ZERO {
                    return Err(ValidationError::NonPositivePrice { field, value });
                }
                check_at_most(field, value, MAX_PRICE)?;
            }
        }
        Ok(())
    }
}

/// Last successful delivery per channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyTimes {
    pub trailing_stop: Option<DateTime<Utc>>,
    pub buy_stop: Option<DateTime<Utc>>,
    pub sell_stop: Option<DateTime<Utc>>,
    pub rise: Option<DateTime<Utc>>,
    pub fall: Option<DateTime<Utc>>,
    pub bull_bear: Option<DateTime<Utc>>,
}

impl NotifyTimes {
    pub fn get(&self, channel: SignalChannel) -> Option<DateTime<Utc>> {
        match channel {
            SignalChannel::TrailingStop => self.trailing_stop,
            SignalChannel::BuyStop => self.buy_stop,
            SignalChannel::SellStop => self.sell_stop,
            SignalChannel::Rise => self.rise,
            SignalChannel::Fall => self.fall,
            SignalChannel::BullBear => self.bull_bear,
        }
    }

    pub fn set(&mut self, channel: SignalChannel, at: DateTime<Utc>) {
        let slot = match channel {
            SignalChannel::TrailingStop => &mut self.trailing_stop,
            SignalChannel::BuyStop => &mut self.buy_stop,
            SignalChannel::SellStop => &mut self.sell_stop,
            SignalChannel::Rise => &mut self.rise,
            SignalChannel::Fall => &mut self.fall,
            SignalChannel::BullBear => &mut self.bull_bear,
        };
        *slot = Some(at);
    }
}

/// A stock owned, shorted or watched by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Zero until the position has been stored
    pub id: PositionId,
    pub user_id: UserId,
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    /// Positive = long, negative = short, zero = watch only
    pub shares: i64,
    pub is_watched: bool,
    pub signals: SignalSettings,
    pub last_notified: NotifyTimes,
}

impl Position {
    pub fn new(
        user_id: UserId,
        symbol: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: Decimal,
        shares: i64,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            symbol: symbol.into(),
            entry_date,
            entry_price,
            shares,
            is_watched: shares == 0,
            signals: SignalSettings::default(),
            last_notified: NotifyTimes::default(),
        }
    }

    pub fn with_signals(mut self, signals: SignalSettings) -> Self {
        self.signals = signals;
        self
    }

    pub fn side(&self) -> PositionSide {
        match self.shares {
            s if s > 0 => PositionSide::Long,
            s if s < 0 => PositionSide::Short,
            _ => PositionSide::Watch,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if !is_valid_symbol(&self.symbol) {
            return Err(ValidationError::InvalidSymbol {
                symbol: self.symbol.clone(),
            });
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice {
                field: "entry_price",
                value: self.entry_price,
            });
        }
        check_at_most("entry_price", self.entry_price, MAX_PRICE)?;
        check_at_most(
            "shares",
            Decimal::from(self.shares.unsigned_abs()),
            Decimal::from(MAX_SHARES),
        )?;
        self.signals.validate()
    }
}
