//! Binance 24h ticker feed
//!
//! Exchange-ticker source: the spot 24h statistics endpoint returns every
//! traded pair. USDT-quoted pairs give a direct USD price per base asset
//! under the USDT peg; ranking weight is 24h quote volume since an
//! exchange reports no market caps.

use crate::core::market::rank_markets;
use crate::core::{CurrencyCode, MarketEntry};
use crate::feeds::{CryptoSnapshot, FeedError, FeedLoader, FeedSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Binance spot 24h ticker client
pub struct BinanceTickerClient {
    client: reqwest::Client,
    /// How many top pairs to keep in the catalog
    depth: usize,
}

impl BinanceTickerClient {
    /// Spot 24h ticker endpoint (all symbols)
    pub const TICKER_URL: &'static str = "https://api.binance.com/api/v3/ticker/24hr";

    /// Create new client keeping the top `depth` pairs
    pub fn new(depth: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("coinfx/0.1")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            depth,
        }
    }

    async fn fetch(&self) -> Result<CryptoSnapshot, FeedError> {
        tracing::info!(target: "feed", "Fetching Binance 24h tickers");

        let response = self
            .client
            .get(Self::TICKER_URL)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()));
        }

        let tickers: Vec<Binance24hTicker> = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        tracing::info!(target: "feed", "Received {} tickers from Binance", tickers.len());

        let snapshot = build_snapshot(tickers, self.depth);
        if snapshot.prices.is_empty() {
            return Err(FeedError::NoEntries);
        }

        tracing::info!(
            target: "feed",
            "Binance snapshot: {} priced pairs",
            snapshot.prices.len()
        );

        Ok(snapshot)
    }
}

impl FeedLoader for BinanceTickerClient {
    fn source(&self) -> FeedSource {
        FeedSource::Binance
    }

    async fn fetch_crypto(&self) -> Result<CryptoSnapshot, FeedError> {
        self.fetch().await
    }
}

/// Split a pair like "BTCUSDT" into its base ticker
fn base_of_usdt_pair(symbol: &str) -> Option<&str> {
    let base = symbol.strip_suffix("USDT")?;
    if base.is_empty() {
        return None;
    }
    Some(base)
}

fn build_snapshot(tickers: Vec<Binance24hTicker>, depth: usize) -> CryptoSnapshot {
    let mut entries: Vec<MarketEntry> = tickers
        .iter()
        .filter_map(|t| {
            let base = base_of_usdt_pair(&t.symbol)?;
            let price = t.last_price.parse::<f64>().ok()?;
            Some(MarketEntry {
                symbol: CurrencyCode::new(base),
                price_usd: price,
                change_24h_abs: t.price_change.parse::<f64>().unwrap_or(0.0),
                change_24h_percent: t.price_change_percent.parse::<f64>().unwrap_or(0.0),
                volume_24h: t.volume.parse::<f64>().unwrap_or(0.0),
                weight: t.quote_volume.parse::<f64>().unwrap_or(0.0),
            })
        })
        .collect();

    entries = rank_markets(entries, depth);

    let prices: HashMap<CurrencyCode, f64> = entries
        .iter()
        .map(|e| (e.symbol.clone(), e.price_usd))
        .collect();

    CryptoSnapshot {
        prices,
        markets: entries,
    }
}

// === API response types ===

/// Binance 24h ticker (prices come as strings)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Binance24hTicker {
    symbol: String,
    last_price: String,
    price_change: String,
    price_change_percent: String,
    volume: String,
    quote_volume: String,
}
