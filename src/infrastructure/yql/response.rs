//! YQL response decoding.
//!
//! `query.results.quote` is `null` when nothing matched, a bare object for a
//! single row and an array otherwise. It is decoded into [`ResultSet`] and
//! then normalised to a `Vec`.

use crate::domain::errors::ProviderError;
use crate::domain::market::price::HistoricalBar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResultSet<T> {
    Many(Vec<T>),
    Single(T),
    Empty,
}

impl<T> Default for ResultSet<T> {
    fn default() -> Self {
        ResultSet::Empty
    }
}

impl<T> ResultSet<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ResultSet::Many(rows) => rows,
            ResultSet::Single(row) => vec![row],
            ResultSet::Empty => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    query: Query<T>,
}

#[derive(Debug, Deserialize)]
struct Query<T> {
    #[serde(default = "Option::default")]
    results: Option<Results<T>>,
}

#[derive(Debug, Deserialize)]
struct Results<T> {
    #[serde(default = "ResultSet::default")]
    quote: ResultSet<T>,
}

/// Extracts the `quote` rows of a YQL response body.
pub fn decode_rows<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, ProviderError> {
    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(|e| ProviderError::Decode {
        reason: e.to_string(),
    })?;
    Ok(envelope
        .query
        .results
        .map(|r| r.quote.into_vec())
        .unwrap_or_default())
}

/// Row of `yahoo.finance.historicaldata`; every value arrives as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRow {
    #[serde(default)]
    pub symbol: Option<String>,
    pub date: String,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    pub volume: String,
}

/// Row of `yahoo.finance.quote`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteRow {
    #[serde(rename = "Symbol", alias = "symbol")]
    pub symbol: String,
    #[serde(rename = "LastTradePriceOnly", default)]
    pub last_trade_price: Option<String>,
}

fn invalid(symbol: &str, reason: String) -> ProviderError {
    ProviderError::InvalidData {
        symbol: symbol.to_string(),
        reason,
    }
}

fn price(symbol: &str, field: &str, value: &str) -> Result<Decimal, ProviderError> {
    Decimal::from_str(value.trim())
        .map_err(|e| invalid(symbol, format!("{} {:?}: {}", field, value, e)))
}

impl HistoryRow {
    pub fn into_bar(self, symbol: &str) -> Result<HistoricalBar, ProviderError> {
        Ok(HistoricalBar {
            date: NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
                .map_err(|e| invalid(symbol, format!("Date {:?}: {}", self.date, e)))?,
            open: price(symbol, "Open", &self.open)?,
            close: price(symbol, "Close", &self.close)?,
            high: price(symbol, "High", &self.high)?,
            low: price(symbol, "Low", &self.low)?,
            volume: self
                .volume
                .trim()
                .parse::<i64>()
                .map_err(|e| invalid(symbol, format!("Volume {:?}: {}", self.volume, e)))?,
        })
    }
}

impl QuoteRow {
    /// Last trade price; a missing, unparsable or non-positive price is an error.
    pub fn price(&self) -> Result<Decimal, ProviderError> {
        let raw = self
            .last_trade_price
            .as_deref()
            .ok_or_else(|| invalid(&self.symbol, "no last trade price".to_string()))?;
        let value = price(&self.symbol, "LastTradePriceOnly", raw)?;
        if value <= Decimal::ZERO {
            return Err(invalid(&self.symbol, format!("non-positive price {}", value)));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ARRAY_BODY: &str = r#"{"query":{"count":1,"created":"2013-12-22T05:22:05Z","lang":"en-US","results":{"quote":[{"Symbol":"MSFT","Close":"36.80","Volume":"62649100","Date":"2013-12-20","Open":"36.20","High":"36.93","Low":"36.19"}]}}}"#;
    const OBJECT_BODY: &str = r#"{"query":{"count":1,"created":"2013-12-22T05:22:05Z","lang":"en-US","results":{"quote":{"Symbol":"MSFT","Close":"36.80","Volume":"62649100","Date":"2013-12-20","Open":"36.20","High":"36.93","Low":"36.19"}}}}"#;

    #[test]
    fn test_array_and_object_decode_alike() {
        let many: Vec<HistoryRow> = decode_rows(ARRAY_BODY.as_bytes()).unwrap();
        let single: Vec<HistoryRow> = decode_rows(OBJECT_BODY.as_bytes()).unwrap();

        assert_eq!(many.len(), 1);
        assert_eq!(many, single);

        let bar = many[0].clone().into_bar("MSFT").unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2013, 12, 20).unwrap());
        assert_eq!(bar.close, dec!(36.80));
        assert_eq!(bar.volume, 62_649_100);
    }

    #[test]
    fn test_null_results_are_empty() {
        let null_quote = r#"{"query":{"count":0,"results":{"quote":null}}}"#;
        let null_results = r#"{"query":{"count":0,"created":"2013-12-22T05:22:05Z","results":null}}"#;

        assert!(decode_rows::<HistoryRow>(null_quote.as_bytes()).unwrap().is_empty());
        assert!(decode_rows::<HistoryRow>(null_results.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            decode_rows::<HistoryRow>(b"<html>rate limited</html>"),
            Err(ProviderError::Decode { .. })
        ));
    }

    #[test]
    fn test_quote_rows() {
        let body = r#"{"query":{"count":2,"results":{"quote":[{"Symbol":"MSFT","LastTradePriceOnly":"36.13"},{"symbol":"XXXX","LastTradePriceOnly":null}]}}}"#;
        let rows: Vec<QuoteRow> = decode_rows(body.as_bytes()).unwrap();

        assert_eq!(rows[0].price().unwrap(), dec!(36.13));
        assert!(matches!(rows[1].price(), Err(ProviderError::InvalidData { .. })));
    }

    #[test]
    fn test_bad_history_values() {
        let mut row: Vec<HistoryRow> = decode_rows(OBJECT_BODY.as_bytes()).unwrap();
        let mut row = row.remove(0);
        row.close = "N/A".to_string();
        assert!(matches!(
            row.into_bar("MSFT"),
            Err(ProviderError::InvalidData { symbol, .. }) if symbol == "MSFT"
        ));
    }
}
