use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency values are kept at cent precision.
pub const PRICE_SCALE: u32 = 2;

/// Daily bar as returned by a quote provider, before it is indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: i64,
}

/// A recorded daily bar; immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub trade_day_index: i64,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: i64,
}

impl PricePoint {
    pub fn from_bar(symbol: &str, trade_day_index: i64, bar: &HistoricalBar) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: bar.date,
            trade_day_index,
            open: bar.open.round_dp(PRICE_SCALE),
            close: bar.close.round_dp(PRICE_SCALE),
            high: bar.high.round_dp(PRICE_SCALE),
            low: bar.low.round_dp(PRICE_SCALE),
            volume: bar.volume,
        }
    }
}

/// Moving-average statistics for one trade day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub trade_day_index: i64,
    pub avg50: f64,
    pub avg200: f64,
    /// (avg50 / avg200 - 1) * 100
    pub sma_percent: f64,
}

/// Cached "current" price for one quote bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyQuote {
    pub symbol: String,
    pub bucket: DateTime<Utc>,
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// Lowest and highest close over a date range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseExtrema {
    pub lowest: Decimal,
    pub highest: Decimal,
}

/// Normalises a user-supplied ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Symbols end up inside provider queries, so only plain ticker characters pass.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 16
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_bar_rounds_to_cents() {
        let bar = HistoricalBar {
            date: NaiveDate::from_ymd_opt(2013, 12, 20).unwrap(),
            open: dec!(36.204),
            close: dec!(36.8),
            high: dec!(36.925),
            low: dec!(36.19),
            volume: 62_649_100,
        };
        let point = PricePoint::from_bar("MSFT", 7, &bar);
        assert_eq!(point.open, dec!(36.20));
        assert_eq!(point.close, dec!(36.80));
        assert_eq!(point.high, dec!(36.92));
        assert_eq!(point.trade_day_index, 7);
    }

    #[test]
    fn test_symbol_validation() {
        assert!(is_valid_symbol("BRK.B"));
        assert!(is_valid_symbol("^GSPC"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("MSFT\" or 1=1"));
        assert!(!is_valid_symbol("msft"));
        assert_eq!(normalize_symbol(" msft "), "MSFT");
    }
}
