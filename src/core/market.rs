//! Market display stats
//!
//! Informational only: ordering decides which entries the UI shows as
//! "top" coins. Conversion correctness never depends on these.

use crate::core::currency::CurrencyCode;
use serde::Serialize;

/// Per-coin stats from one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketEntry {
    pub symbol: CurrencyCode,
    /// USD price per unit
    pub price_usd: f64,
    /// 24h absolute price change in USD
    pub change_24h_abs: f64,
    /// 24h percentage price change
    pub change_24h_percent: f64,
    /// 24h traded volume
    pub volume_24h: f64,
    /// Ranking weight: market cap (aggregator feed) or 24h quote volume
    /// (exchange ticker feed)
    pub weight: f64,
}

impl MarketEntry {
    /// Entry with zeroed stats, for static fallback data
    pub fn placeholder(symbol: CurrencyCode, price_usd: f64) -> Self {
        Self {
            symbol,
            price_usd,
            change_24h_abs: 0.0,
            change_24h_percent: 0.0,
            volume_24h: 0.0,
            weight: 0.0,
        }
    }
}

/// Sort entries by descending weight and keep the top `depth`
pub fn rank_markets(mut entries: Vec<MarketEntry>, depth: usize) -> Vec<MarketEntry> {
    entries.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.truncate(depth);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, weight: f64) -> MarketEntry {
        MarketEntry {
            symbol: CurrencyCode::new(symbol),
            price_usd: 1.0,
            change_24h_abs: 0.0,
            change_24h_percent: 0.0,
            volume_24h: weight,
            weight,
        }
    }

    #[test]
    fn test_rank_orders_by_descending_weight() {
        let ranked = rank_markets(
            vec![entry("ADA", 10.0), entry("BTC", 500.0), entry("ETH", 200.0)],
            3,
        );
        let symbols: Vec<&str> = ranked.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "ADA"]);
    }

    #[test]
    fn test_rank_truncates_to_depth() {
        let ranked = rank_markets(
            vec![entry("A", 1.0), entry("B", 2.0), entry("C", 3.0)],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].symbol.as_str(), "C");
    }

    #[test]
    fn test_placeholder_has_zero_stats() {
        let e = MarketEntry::placeholder(CurrencyCode::new("BTC"), 98_000.0);
        assert_eq!(e.price_usd, 98_000.0);
        assert_eq!(e.change_24h_percent, 0.0);
        assert_eq!(e.weight, 0.0);
    }
}
