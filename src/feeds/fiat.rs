//! Fiat exchange-rate feed
//!
//! One request returns every rate relative to the USD base. Values are
//! units of each fiat per one USD, the opposite direction of the crypto
//! table.

use crate::core::catalog::FALLBACK_FIAT_RATES;
use crate::core::CurrencyCode;
use crate::feeds::FeedError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Fiat rates client
pub struct FiatRateClient {
    client: reqwest::Client,
}

impl FiatRateClient {
    /// USD-based rates endpoint
    pub const RATES_URL: &'static str = "https://api.exchangerate-api.com/v4/latest/USD";

    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("coinfx/0.1")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Fetch live per-USD rates
    pub async fn fetch_rates(&self) -> Result<HashMap<CurrencyCode, f64>, FeedError> {
        tracing::info!(target: "feed", "Fetching fiat rates");

        let response = self
            .client
            .get(Self::RATES_URL)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Http(response.status().as_u16()));
        }

        let payload: ExchangeRateResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        if payload.rates.is_empty() {
            return Err(FeedError::NoEntries);
        }

        tracing::info!(target: "feed", "Received {} fiat rates", payload.rates.len());

        Ok(payload
            .rates
            .into_iter()
            .map(|(code, rate)| (CurrencyCode::new(&code), rate))
            .collect())
    }

    /// Static rate table substituted when the fetch fails
    pub fn fallback_rates() -> HashMap<CurrencyCode, f64> {
        FALLBACK_FIAT_RATES
            .iter()
            .map(|&(code, rate)| (CurrencyCode::new(code), rate))
            .collect()
    }
}

impl Default for FiatRateClient {
    fn default() -> Self {
        Self::new()
    }
}

// === API response types ===

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    rates: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_deserialize() {
        let json = r#"{
            "base": "USD",
            "date": "2026-08-06",
            "rates": { "USD": 1, "EUR": 0.92, "JPY": 149.5 }
        }"#;
        let payload: ExchangeRateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.rates.len(), 3);
        assert_eq!(payload.rates.get("EUR"), Some(&0.92));
    }

    #[test]
    fn test_fallback_rates_cover_majors() {
        let rates = FiatRateClient::fallback_rates();
        assert!(rates.len() >= 19);
        assert_eq!(rates.get("USD"), Some(&1.0));
        assert!(rates.contains_key("EUR"));
        assert!(rates.contains_key("JPY"));
        assert!(rates.contains_key("CNY"));
    }
}
