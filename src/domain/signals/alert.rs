use crate::domain::signals::evaluator::{Crossover, FiredSignal, Trigger};
use crate::domain::tracking::position::PositionSide;
use rust_decimal::Decimal;

/// An outbound HTML alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl AlertMessage {
    /// Words the alert for `signal`. The sender is a per-symbol address on
    /// `from_domain` so users can filter alerts by stock.
    pub fn compose(signal: &FiredSignal, to: &str, from_domain: &str) -> Self {
        let symbol = &signal.symbol;
        let price = cents(signal.current_price);

        let (subject, body) = match &signal.trigger {
            Trigger::TrailingStop { stop_price, side } => {
                let (verb, stop) = match side {
                    PositionSide::Short => ("rose above", cents(*stop_price)),
                    _ => ("fell below", cents(*stop_price)),
                };
                (
                    format!("{symbol} price {verb} trailing stop {stop}"),
                    format!("{symbol} current price {price} just {verb} trailing stop price {stop}"),
                )
            }
            Trigger::BuyStop { stop_price } => {
                let stop = cents(*stop_price);
                (
                    format!("{symbol} price fell below buy stop {stop}"),
                    format!("{symbol} current price {price} just fell below buy stop price {stop}"),
                )
            }
            Trigger::SellStop { stop_price } => {
                let stop = cents(*stop_price);
                (
                    format!("{symbol} price rose above sell stop {stop}"),
                    format!("{symbol} current price {price} just rose above sell stop price {stop}"),
                )
            }
            Trigger::Rise {
                change_percent,
                threshold_percent,
                previous_close,
            } => {
                let chg = cents(*change_percent);
                (
                    format!("{symbol} price rose {chg}%"),
                    format!(
                        "{symbol} current price {price} is up {chg}% from previous close {}, rise threshold {}%",
                        cents(*previous_close),
                        cents(*threshold_percent)
                    ),
                )
            }
            Trigger::Fall {
                change_percent,
                threshold_percent,
                previous_close,
            } => {
                let chg = cents(change_percent.abs());
                (
                    format!("{symbol} price fell {chg}%"),
                    format!(
                        "{symbol} current price {price} is down {chg}% from previous close {}, fall threshold {}%",
                        cents(*previous_close),
                        cents(*threshold_percent)
                    ),
                )
            }
            Trigger::Crossover {
                direction,
                sma_percent,
            } => {
                let (trend, relation) = match direction {
                    Crossover::Bull => ("bullish", "above"),
                    Crossover::Bear => ("bearish", "below"),
                };
                (
                    format!("{symbol} turned {trend}"),
                    format!(
                        "{symbol} 50 day average crossed {relation} the 200 day average ({sma_percent:.2}%), current price {price}"
                    ),
                )
            }
        };

        Self {
            from: format!("stock-watcher-{symbol} <stock.watcher.{symbol}@{from_domain}>"),
            to: to.to_string(),
            subject,
            html_body: format!("<html><body>{body}</body></html>"),
        }
    }
}

fn cents(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}
