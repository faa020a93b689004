//! Price feed loaders
//!
//! Two interchangeable crypto sources (a market-data aggregator and an
//! exchange 24h ticker) behind one loader contract, plus the fiat rate
//! source. The conversion core never knows which loader populated the
//! catalog.

pub mod binance;
pub mod coingecko;
pub mod fiat;

pub use binance::BinanceTickerClient;
pub use coingecko::CoinGeckoClient;
pub use fiat::FiatRateClient;

use crate::core::catalog::FALLBACK_CRYPTO_PRICES;
use crate::core::{CurrencyCode, MarketEntry};
use std::collections::HashMap;
use std::str::FromStr;

/// Crypto feed identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedSource {
    CoinGecko,
    Binance,
}

impl FeedSource {
    pub fn name(&self) -> &'static str {
        match self {
            FeedSource::CoinGecko => "coingecko",
            FeedSource::Binance => "binance",
        }
    }
}

impl FromStr for FeedSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coingecko" => Ok(FeedSource::CoinGecko),
            "binance" => Ok(FeedSource::Binance),
            other => Err(format!("unknown feed source: {}", other)),
        }
    }
}

/// One fetched crypto snapshot: prices plus ordered market entries
#[derive(Debug, Clone)]
pub struct CryptoSnapshot {
    /// USD price per unit, keyed by ticker
    pub prices: HashMap<CurrencyCode, f64>,
    /// Display entries, descending weight
    pub markets: Vec<MarketEntry>,
}

impl CryptoSnapshot {
    /// Static snapshot substituted when a crypto fetch fails
    pub fn fallback() -> Self {
        let prices = FALLBACK_CRYPTO_PRICES
            .iter()
            .map(|&(code, price)| (CurrencyCode::new(code), price))
            .collect();
        let markets = FALLBACK_CRYPTO_PRICES
            .iter()
            .map(|&(code, price)| MarketEntry::placeholder(CurrencyCode::new(code), price))
            .collect();
        Self { prices, markets }
    }
}

/// Feed fetch errors
///
/// These never cross the loader layer: the refresher substitutes the
/// static fallback snapshot, so a down feed degrades accuracy without
/// ever failing a conversion.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Feed returned no entries")]
    NoEntries,
}

/// Crypto price feed interface
///
/// # Design Notes
/// - Async fetch methods, `Result` for explicit error handling
/// - `fallback_snapshot()` is static data and cannot fail, so "no data at
///   all" is unrepresentable downstream of a loader
#[allow(async_fn_in_trait)]
pub trait FeedLoader: Send + Sync {
    /// Get feed identifier
    fn source(&self) -> FeedSource;

    /// Get feed name (for logging)
    fn name(&self) -> &'static str {
        self.source().name()
    }

    /// Fetch the live crypto snapshot
    async fn fetch_crypto(&self) -> Result<CryptoSnapshot, FeedError>;

    /// Static snapshot substituted when `fetch_crypto` fails
    fn fallback_snapshot(&self) -> CryptoSnapshot {
        CryptoSnapshot::fallback()
    }
}

/// Enum dispatch over the configured crypto loader (cold path)
pub enum CryptoFeed {
    CoinGecko(CoinGeckoClient),
    Binance(BinanceTickerClient),
}

impl CryptoFeed {
    /// Build the loader selected in configuration
    pub fn from_source(source: FeedSource, depth: usize) -> Self {
        match source {
            FeedSource::CoinGecko => CryptoFeed::CoinGecko(CoinGeckoClient::new(depth)),
            FeedSource::Binance => CryptoFeed::Binance(BinanceTickerClient::new(depth)),
        }
    }

    pub fn source(&self) -> FeedSource {
        match self {
            CryptoFeed::CoinGecko(client) => client.source(),
            CryptoFeed::Binance(client) => client.source(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.source().name()
    }

    pub async fn fetch_crypto(&self) -> Result<CryptoSnapshot, FeedError> {
        match self {
            CryptoFeed::CoinGecko(client) => client.fetch_crypto().await,
            CryptoFeed::Binance(client) => client.fetch_crypto().await,
        }
    }

    pub fn fallback_snapshot(&self) -> CryptoSnapshot {
        match self {
            CryptoFeed::CoinGecko(client) => client.fallback_snapshot(),
            CryptoFeed::Binance(client) => client.fallback_snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parsing() {
        assert_eq!("coingecko".parse::<FeedSource>(), Ok(FeedSource::CoinGecko));
        assert_eq!("Binance".parse::<FeedSource>(), Ok(FeedSource::Binance));
        assert!("kraken".parse::<FeedSource>().is_err());
    }

    #[test]
    fn test_fallback_snapshot_invariants() {
        let snapshot = CryptoSnapshot::fallback();
        assert_eq!(snapshot.prices.get("USDT"), Some(&1.0));
        assert_eq!(snapshot.prices.get("BTC"), Some(&98_000.0));
        assert_eq!(snapshot.prices.len(), snapshot.markets.len());
    }

    #[test]
    fn test_enum_dispatch_matches_source() {
        let feed = CryptoFeed::from_source(FeedSource::Binance, 50);
        assert_eq!(feed.source(), FeedSource::Binance);
        assert_eq!(feed.name(), "binance");
    }
}
