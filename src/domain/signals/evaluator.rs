//! Pure signal evaluation for a single position.
//!
//! Currency math (trailing stop, gain in dollars) stays in `Decimal`; only the
//! reported percentages are converted to `f64`.

use crate::domain::market::price::CloseExtrema;
use crate::domain::signals::channel::SignalChannel;
use crate::domain::tracking::position::{Position, PositionSide};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

/// Direction of a 50/200-day average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bull,
    Bear,
}

/// Market data a position is evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalInputs {
    pub current_price: Decimal,
    /// Lowest/highest close since the entry date
    pub extrema: Option<CloseExtrema>,
    /// Close of the most recent recorded trade day (N1)
    pub previous_close: Option<Decimal>,
    pub latest_sma_percent: Option<f64>,
    pub prior_sma_percent: Option<f64>,
}

/// What made a channel fire, with the values needed to word the alert.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    TrailingStop {
        stop_price: Decimal,
        side: PositionSide,
    },
    BuyStop {
        stop_price: Decimal,
    },
    SellStop {
        stop_price: Decimal,
    },
    Rise {
        change_percent: Decimal,
        threshold_percent: Decimal,
        previous_close: Decimal,
    },
    Fall {
        change_percent: Decimal,
        threshold_percent: Decimal,
        previous_close: Decimal,
    },
    Crossover {
        direction: Crossover,
        sma_percent: f64,
    },
}

impl Trigger {
    pub fn channel(&self) -> SignalChannel {
        match self {
            Trigger::TrailingStop { .. } => SignalChannel::TrailingStop,
            Trigger::BuyStop { .. } => SignalChannel::BuyStop,
            Trigger::SellStop { .. } => SignalChannel::SellStop,
            Trigger::Rise { .. } => SignalChannel::Rise,
            Trigger::Fall { .. } => SignalChannel::Fall,
            Trigger::Crossover { .. } => SignalChannel::BullBear,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiredSignal {
    pub symbol: String,
    pub current_price: Decimal,
    pub trigger: Trigger,
}

impl FiredSignal {
    pub fn channel(&self) -> SignalChannel {
        self.trigger.channel()
    }
}

/// Derived figures shown next to a position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionStats {
    pub current_price: Decimal,
    pub trailing_stop_price: Option<Decimal>,
    pub gain_dollar: Decimal,
    pub gain_percent: f64,
    pub change_percent: Option<f64>,
    pub crossover: Option<Crossover>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub stats: PositionStats,
    pub fired: Vec<FiredSignal>,
}

/// Stop price trailing the best close since entry: below the highest close
/// for long and watched positions, above the lowest close for shorts.
pub fn trailing_stop_price(side: PositionSide, percent: Decimal, extrema: &CloseExtrema) -> Decimal {
    match side {
        PositionSide::Short => (Decimal::ONE_HUNDRED + percent) * dec!(0.01) * extrema.lowest,
        PositionSide::Long | PositionSide::Watch => {
            (Decimal::ONE_HUNDRED - percent) * dec!(0.01) * extrema.highest
        }
    }
}

/// Returns (gain in dollars, gain in percent). Shorts gain when the price
/// drops, so their percent is taken against the current price.
pub fn gain_loss(position: &Position, current_price: Decimal) -> (Decimal, f64) {
    let gain_dollar = (current_price - position.entry_price) * Decimal::from(position.shares);
    let ratio = match position.side() {
        PositionSide::Short => position.entry_price.checked_div(current_price),
        PositionSide::Long | PositionSide::Watch => current_price.checked_div(position.entry_price),
    };
    let gain_percent = ratio
        .map(|r| (r - Decimal::ONE) * Decimal::ONE_HUNDRED)
        .and_then(|pct| pct.to_f64())
        .unwrap_or_default();
    (gain_dollar, gain_percent)
}

/// Percent change of the current price against the previous close.
pub fn change_percent(current_price: Decimal, previous_close: Decimal) -> Option<Decimal> {
    current_price
        .checked_div(previous_close)
        .map(|r| (r - Decimal::ONE) * Decimal::ONE_HUNDRED)
}

/// Compares the SMA percent of the latest trade day (N1) to the one before (N2).
pub fn crossover(latest: f64, prior: f64) -> Option<Crossover> {
    if prior < 0.0 && latest >= 0.0 {
        Some(Crossover::Bull)
    } else if prior >= 0.0 && latest < 0.0 {
        Some(Crossover::Bear)
    } else {
        None
    }
}

/// Evaluates every enabled channel of `position`. A channel is considered
/// only when its notify flag is on and the data it needs is available.
pub fn evaluate(position: &Position, inputs: &SignalInputs) -> Evaluation {
    let settings = &position.signals;
    let price = inputs.current_price;
    let side = position.side();
    let mut fired = Vec::new();
    let mut fire = |trigger: Trigger| {
        fired.push(FiredSignal {
            symbol: position.symbol.clone(),
            current_price: price,
            trigger,
        })
    };

    let trailing_stop = settings
        .trailing_stop_percent
        .zip(inputs.extrema.as_ref())
        .map(|(percent, extrema)| trailing_stop_price(side, percent, extrema));
    if settings.is_enabled(SignalChannel::TrailingStop)
        && let Some(stop_price) = trailing_stop
    {
        let crossed = match side {
            PositionSide::Short => price >= stop_price,
            PositionSide::Long | PositionSide::Watch => price <= stop_price,
        };
        if crossed {
            fire(Trigger::TrailingStop { stop_price, side });
        }
    }

    if settings.is_enabled(SignalChannel::BuyStop)
        && let Some(stop_price) = settings.buy_stop_price
        && price <= stop_price
    {
        fire(Trigger::BuyStop { stop_price });
    }

    if settings.is_enabled(SignalChannel::SellStop)
        && let Some(stop_price) = settings.sell_stop_price
        && price >= stop_price
    {
        fire(Trigger::SellStop { stop_price });
    }

    let change = inputs
        .previous_close
        .and_then(|prev| change_percent(price, prev).map(|chg| (prev, chg)));
    if let Some((previous_close, change_percent)) = change {
        if settings.is_enabled(SignalChannel::Rise)
            && let Some(threshold_percent) = settings.rise_percent
            && change_percent >= threshold_percent
        {
            fire(Trigger::Rise {
                change_percent,
                threshold_percent,
                previous_close,
            });
        }
        if settings.is_enabled(SignalChannel::Fall)
            && let Some(threshold_percent) = settings.fall_percent
            && change_percent <= -threshold_percent
        {
            fire(Trigger::Fall {
                change_percent,
                threshold_percent,
                previous_close,
            });
        }
    }

    let cross = inputs
        .latest_sma_percent
        .zip(inputs.prior_sma_percent)
        .and_then(|(latest, prior)| crossover(latest, prior));
    if settings.is_enabled(SignalChannel::BullBear)
        && let Some(direction) = cross
    {
        fire(Trigger::Crossover {
            direction,
            sma_percent: inputs.latest_sma_percent.unwrap_or_default(),
        });
    }

    let (gain_dollar, gain_percent) = gain_loss(position, price);
    Evaluation {
        stats: PositionStats {
            current_price: price,
            trailing_stop_price: trailing_stop,
            gain_dollar,
            gain_percent,
            change_percent: change.and_then(|(_, chg)| chg.to_f64()),
            crossover: cross,
        },
        fired,
    }
}
