//! CoinGecko market feed
//!
//! Market-data aggregator source: one request returns the top coins by
//! market cap with price and 24h stats. Coins are identified by slug ids,
//! so tickers come from an override table first and the reported symbol
//! second.

use crate::core::market::rank_markets;
use crate::core::{CurrencyCode, MarketEntry};
use crate::feeds::{CryptoSnapshot, FeedError, FeedLoader, FeedSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko slug id -> ticker, for ids whose slug does not spell the symbol
const SYMBOL_OVERRIDES: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("tether", "USDT"),
    ("binancecoin", "BNB"),
    ("solana", "SOL"),
    ("ripple", "XRP"),
    ("cardano", "ADA"),
    ("dogecoin", "DOGE"),
    ("usd-coin", "USDC"),
    ("staked-ether", "STETH"),
    ("avalanche-2", "AVAX"),
    ("tron", "TRX"),
    ("polkadot", "DOT"),
    ("chainlink", "LINK"),
    ("polygon", "MATIC"),
    ("shiba-inu", "SHIB"),
    ("litecoin", "LTC"),
    ("bitcoin-cash", "BCH"),
    ("uniswap", "UNI"),
    ("stellar", "XLM"),
    ("cosmos", "ATOM"),
    ("ethereum-classic", "ETC"),
    ("monero", "XMR"),
    ("filecoin", "FIL"),
    ("hedera-hashgraph", "HBAR"),
    ("aptos", "APT"),
    ("optimism", "OP"),
    ("arbitrum", "ARB"),
    ("near", "NEAR"),
    ("vechain", "VET"),
    ("algorand", "ALGO"),
    ("internet-computer", "ICP"),
    ("quant", "QNT"),
    ("aave", "AAVE"),
    ("the-graph", "GRT"),
    ("eos", "EOS"),
    ("axie-infinity", "AXS"),
    ("tezos", "XTZ"),
    ("sandbox", "SAND"),
    ("theta-token", "THETA"),
    ("elrond-erd-2", "EGLD"),
    ("flow", "FLOW"),
    ("decentraland", "MANA"),
    ("fantom", "FTM"),
    ("zcash", "ZEC"),
    ("maker", "MKR"),
    ("curve-dao-token", "CRV"),
];

/// CoinGecko markets client
pub struct CoinGeckoClient {
    client: reqwest::Client,
    /// How many top coins to keep in the catalog
    depth: usize,
}

impl CoinGeckoClient {
    /// Markets endpoint: top 100 by market cap with 24h change
    pub const MARKETS_URL: &'static str = "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=100&page=1&sparkline=false&price_change_percentage=24h";

    /// Create new client keeping the top `depth` coins
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
        tracing::info!(target: "feed", "Fetching CoinGecko markets");

        let response = self
            .client
            .get(Self::MARKETS_URL)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()));
        }

        let coins: Vec<CoinGeckoMarket> = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        tracing::info!(target: "feed", "Received {} coins from CoinGecko", coins.len());

        let snapshot = build_snapshot(coins, self.depth);
        if snapshot.prices.is_empty() {
            return Err(FeedError::NoEntries);
        }

        tracing::info!(
            target: "feed",
            "CoinGecko snapshot: {} priced coins",
            snapshot.prices.len()
        );

        Ok(snapshot)
    }
}

impl FeedLoader for CoinGeckoClient {
    fn source(&self) -> FeedSource {
        FeedSource::CoinGecko
    }

    async fn fetch_crypto(&self) -> Result<CryptoSnapshot, FeedError> {
        self.fetch().await
    }
}

/// Resolve a coin to its ticker: override table first, reported symbol second
fn ticker_for(coin: &CoinGeckoMarket) -> CurrencyCode {
    for &(id, ticker) in SYMBOL_OVERRIDES {
        if id == coin.id {
            return CurrencyCode::new(ticker);
        }
    }
    CurrencyCode::new(&coin.symbol)
}

fn build_snapshot(coins: Vec<CoinGeckoMarket>, depth: usize) -> CryptoSnapshot {
    let mut prices = HashMap::new();
    let mut markets = Vec::new();

    for coin in coins.into_iter().take(depth) {
        // A coin without a current price cannot be stored at all; a coin
        // with a zero price stays present and fails later as unpriced
        let Some(price) = coin.current_price else {
            continue;
        };
        let symbol = ticker_for(&coin);

        prices.insert(symbol.clone(), price);
        markets.push(MarketEntry {
            symbol,
            price_usd: price,
            change_24h_abs: coin.price_change_24h.unwrap_or(0.0),
            change_24h_percent: coin.price_change_percentage_24h.unwrap_or(0.0),
            volume_24h: coin.total_volume.unwrap_or(0.0),
            weight: coin.market_cap.unwrap_or(0.0),
        });
    }

    let count = markets.len();
    CryptoSnapshot {
        prices,
        markets: rank_markets(markets, count),
    }
}

// === API response types ===

#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    id: String,
    symbol: String,
    current_price: Option<f64>,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": "bitcoin",
            "symbol": "btc",
            "current_price": 98000.0,
            "price_change_24h": 1200.5,
            "price_change_percentage_24h": 1.24,
            "total_volume": 35000000000.0,
            "market_cap": 1900000000000.0
        },
        {
            "id": "avalanche-2",
            "symbol": "avax",
            "current_price": 42.0,
            "price_change_24h": -0.8,
            "price_change_percentage_24h": -1.87,
            "total_volume": 600000000.0,
            "market_cap": 17000000000.0
        },
        {
            "id": "some-dead-coin",
            "symbol": "rip",
            "current_price": null,
            "price_change_24h": null,
            "price_change_percentage_24h": null,
            "total_volume": null,
            "market_cap": null
        }
    ]"#;

    #[test]
    fn test_markets_deserialize() {
        let coins: Vec<CoinGeckoMarket> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(coins.len(), 3);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[2].current_price, None);
    }

    #[test]
    fn test_ticker_override_beats_reported_symbol() {
        let coins: Vec<CoinGeckoMarket> = serde_json::from_str(SAMPLE).unwrap();
        // "avalanche-2" reports symbol "avax" but the override also says AVAX;
        // the interesting case is the slug id not spelling the ticker
        assert_eq!(ticker_for(&coins[1]).as_str(), "AVAX");
        assert_eq!(ticker_for(&coins[0]).as_str(), "BTC");
        // Unmapped ids fall back to the uppercased reported symbol
        assert_eq!(ticker_for(&coins[2]).as_str(), "RIP");
    }

    #[test]
    fn test_build_snapshot_skips_unpriced_coins() {
        let coins: Vec<CoinGeckoMarket> = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = build_snapshot(coins, 50);
        assert_eq!(snapshot.prices.len(), 2);
        assert!(!snapshot.prices.contains_key("RIP"));
        assert_eq!(snapshot.markets[0].symbol.as_str(), "BTC");
    }

    #[test]
    fn test_build_snapshot_respects_depth() {
        let coins: Vec<CoinGeckoMarket> = serde_json::from_str(SAMPLE).unwrap();
        let snapshot = build_snapshot(coins, 1);
        assert_eq!(snapshot.prices.len(), 1);
        assert!(snapshot.prices.contains_key("BTC"));
    }
}
