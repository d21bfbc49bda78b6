//! Current-price cache.
//!
//! A price is fetched at most once per quote bucket. Symbols without a row
//! for the current bucket (or all symbols when forced) are fetched from the
//! provider in a single batch; a provider failure fails the whole call.

use crate::domain::market::calendar::AsOf;
use crate::domain::market::price::HourlyQuote;
use crate::domain::ports::QuoteProvider;
use crate::domain::repositories::HourlyQuoteRepository;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct QuoteCache {
    quotes: Arc<dyn HourlyQuoteRepository>,
    provider: Arc<dyn QuoteProvider>,
}

impl QuoteCache {
    pub fn new(quotes: Arc<dyn HourlyQuoteRepository>, provider: Arc<dyn QuoteProvider>) -> Self {
        Self { quotes, provider }
    }

    pub async fn get_current_prices(
        &self,
        symbols: &[String],
        as_of: &AsOf,
        force: bool,
    ) -> Result<HashMap<String, Decimal>> {
        let mut prices = HashMap::with_capacity(symbols.len());
        let mut batch: Vec<String> = Vec::new();

        for symbol in symbols {
            if prices.contains_key(symbol) || batch.contains(symbol) {
                continue;
            }
            if !force
                && let Some(cached) = self
                    .quotes
                    .find(symbol, as_of.quote_bucket)
                    .await
                    .with_context(|| format!("Failed to read cached quote of {}", symbol))?
            {
                debug!("{}: cached price {} for {}", symbol, cached.price, as_of.quote_bucket);
                prices.insert(symbol.clone(), cached.price);
                continue;
            }
            batch.push(symbol.clone());
        }

        if batch.is_empty() {
            return Ok(prices);
        }

        info!("Fetching current prices for {:?}", batch);
        let fetched = self
            .provider
            .fetch_current(&batch)
            .await
            .context("Failed to fetch current prices")?;

        for (symbol, price) in fetched {
            self.quotes
                .upsert(&HourlyQuote {
                    symbol: symbol.clone(),
                    bucket: as_of.quote_bucket,
                    price,
                    fetched_at: as_of.now,
                })
                .await
                .with_context(|| format!("Failed to cache quote of {}", symbol))?;
            prices.insert(symbol, price);
        }

        Ok(prices)
    }
}
