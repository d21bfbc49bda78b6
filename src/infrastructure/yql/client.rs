use crate::config::ProviderEnvConfig;
use crate::domain::errors::ProviderError;
use crate::domain::market::price::{HistoricalBar, is_valid_symbol};
use crate::domain::ports::QuoteProvider;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use crate::infrastructure::yql::response::{HistoryRow, QuoteRow, decode_rows};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, info};

const DATE_FMT: &str = "%Y-%m-%d";

/// Quote provider backed by the Yahoo YQL public endpoint.
pub struct YqlQuoteProvider {
    client: ClientWithMiddleware,
    base_url: String,
    env: String,
    timeout_secs: u64,
    window_days: i64,
}

impl YqlQuoteProvider {
    pub fn new(config: &ProviderEnvConfig) -> Self {
        Self {
            client: HttpClientFactory::create_client(
                std::time::Duration::from_secs(config.timeout_secs),
                config.max_retries,
            ),
            base_url: config.base_url.clone(),
            env: config.datatable_env.clone(),
            timeout_secs: config.timeout_secs,
            window_days: config.history_window_days,
        }
    }

    async fn query<T: DeserializeOwned>(&self, yql: &str) -> Result<Vec<T>, ProviderError> {
        let url = build_url_with_query(
            &self.base_url,
            &[("q", yql), ("format", "json"), ("env", self.env.as_str())],
        )
        .map_err(|e| ProviderError::Http {
            reason: format!("Invalid provider URL {:?}: {}", self.base_url, e),
        })?;

        debug!("YQL query: {}", yql);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let mime = content_type.split(';').next().unwrap_or_default().trim();
            if mime != "application/json" {
                return Err(ProviderError::ContentType {
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response.bytes().await.map_err(|e| self.reqwest_error(e))?;
        decode_rows(&body)
    }

    fn transport_error(&self, err: reqwest_middleware::Error) -> ProviderError {
        match err {
            reqwest_middleware::Error::Reqwest(e) => self.reqwest_error(e),
            other => ProviderError::Http {
                reason: other.to_string(),
            },
        }
    }

    fn reqwest_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                duration_secs: self.timeout_secs,
            }
        } else {
            ProviderError::Http {
                reason: err.to_string(),
            }
        }
    }
}

fn ensure_symbol(symbol: &str) -> Result<(), ProviderError> {
    if is_valid_symbol(symbol) {
        Ok(())
    } else {
        Err(ProviderError::InvalidSymbol {
            symbol: symbol.to_string(),
        })
    }
}

pub fn current_query(symbols: &[String]) -> String {
    let list = symbols
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "select Symbol, LastTradePriceOnly from yahoo.finance.quote where symbol in ({})",
        list
    )
}

pub fn history_query(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "select Symbol, Date, Open, Close, High, Low, Volume from yahoo.finance.historicaldata \
         where symbol = \"{}\" and startDate = \"{}\" and endDate = \"{}\"",
        symbol,
        start.format(DATE_FMT),
        end.format(DATE_FMT)
    )
}

/// Splits `[start, end]` into consecutive windows of at most `window_days` days.
pub fn split_windows(start: NaiveDate, end: NaiveDate, window_days: i64) -> Vec<(NaiveDate, NaiveDate)> {
    let span = Duration::days(window_days.max(1) - 1);
    let mut windows = Vec::new();
    let mut from = start;
    while from <= end {
        let to = (from + span).min(end);
        windows.push((from, to));
        from = to + Duration::days(1);
    }
    windows
}

#[async_trait]
impl QuoteProvider for YqlQuoteProvider {
    async fn fetch_current(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, ProviderError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        for symbol in symbols {
            ensure_symbol(symbol)?;
        }

        let rows: Vec<QuoteRow> = self.query(&current_query(symbols)).await?;
        let mut prices = HashMap::with_capacity(rows.len());
        for row in rows {
            let price = row.price()?;
            prices.insert(row.symbol.to_uppercase(), price);
        }

        if let Some(missing) = symbols.iter().find(|s| !prices.contains_key(s.as_str())) {
            return Err(ProviderError::InvalidData {
                symbol: missing.clone(),
                reason: "no quote in response".to_string(),
            });
        }

        info!("YQL: fetched {} current prices", prices.len());
        Ok(prices)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, ProviderError> {
        ensure_symbol(symbol)?;

        let mut bars = Vec::new();
        for (from, to) in split_windows(start, end, self.window_days) {
            let rows: Vec<HistoryRow> = self.query(&history_query(symbol, from, to)).await?;
            debug!("YQL: {} rows for {} {}..{}", rows.len(), symbol, from, to);
            for row in rows {
                bars.push(row.into_bar(symbol)?);
            }
        }

        // Windows come back newest first; normalise to ascending unique dates
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }
}
