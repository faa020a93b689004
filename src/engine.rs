//! Conversion engine
//!
//! Routes any source currency to any target currency through the USD
//! pivot. Stateless: each call reads one catalog snapshot and computes
//! against that alone, so a refresh landing mid-session never mixes old
//! and new prices within a single conversion.

use crate::core::{CatalogError, CurrencyCode, CurrencyKind, PriceCatalog, SharedCatalog};
use thiserror::Error;

/// Conversion failures
///
/// Distinguishable on purpose: a caller must be able to tell "the result
/// is zero" from "the conversion failed".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// Amount is negative, NaN or infinite
    #[error("Invalid amount: {value}")]
    InvalidAmount { value: f64 },

    /// Code absent from both catalog tables
    #[error("Unknown currency: {code}")]
    UnknownCurrency { code: CurrencyCode },

    /// Code known but its stored price/rate is unusable
    #[error("Price unavailable for {code}")]
    PriceUnavailable { code: CurrencyCode },
}

impl From<CatalogError> for ConvertError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unknown { code } => ConvertError::UnknownCurrency { code },
            CatalogError::Unpriced { code } => ConvertError::PriceUnavailable { code },
        }
    }
}

/// One conversion request
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: &str, to: &str) -> Self {
        Self {
            amount,
            from: CurrencyCode::new(from),
            to: CurrencyCode::new(to),
        }
    }
}

/// Converted amount plus the implied per-unit rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub converted_amount: f64,
    /// Target units per one source unit, valid even for a zero amount
    pub unit_rate: f64,
}

/// Stateless converter over the shared catalog
pub struct ConversionEngine {
    catalog: SharedCatalog,
}

impl ConversionEngine {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }

    /// Convert against the current catalog snapshot
    pub fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let snapshot = self.catalog.snapshot();
        Self::convert_with(&snapshot, request)
    }

    /// Pure pivot conversion against one snapshot
    ///
    /// For a zero amount the converted value is zero but the rate is
    /// still reported, from a synthetic one-unit run.
    pub fn convert_with(
        catalog: &PriceCatalog,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConvertError> {
        let amount = request.amount;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ConvertError::InvalidAmount { value: amount });
        }

        let converted_amount = pivot(catalog, amount, &request.from, &request.to)?;
        let unit_rate = if amount > 0.0 {
            converted_amount / amount
        } else {
            pivot(catalog, 1.0, &request.from, &request.to)?
        };

        Ok(ConversionResult {
            converted_amount,
            unit_rate,
        })
    }
}

/// Source -> USD -> target
///
/// The two tables are quoted in opposite directions: crypto is USD per
/// unit (multiply on the way in, divide on the way out), fiat is units
/// per USD (divide on the way in, multiply on the way out).
fn pivot(
    catalog: &PriceCatalog,
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<f64, ConvertError> {
    let usd_value = catalog.price_in_usd(from)? * amount;

    let converted = match catalog.classify(to) {
        // Dollars over dollars-per-coin yields coins
        CurrencyKind::Crypto => usd_value / catalog.priced_usd_per_unit(to)?,
        // Dollars times fiat-per-dollar yields fiat units
        CurrencyKind::Fiat => usd_value * catalog.priced_units_per_usd(to)?,
        CurrencyKind::Unknown => {
            return Err(ConvertError::UnknownCurrency { code: to.clone() })
        }
    };

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_catalog() -> PriceCatalog {
        let crypto: HashMap<CurrencyCode, f64> = [
            ("BTC", 98_000.0),
            ("ETH", 3_500.0),
            ("USDT", 1.0),
            ("DEAD", 0.0),
        ]
        .into_iter()
        .map(|(c, p)| (CurrencyCode::new(c), p))
        .collect();
        let fiat: HashMap<CurrencyCode, f64> = [("USD", 1.0), ("EUR", 0.92), ("JPY", 149.50)]
            .into_iter()
            .map(|(c, r)| (CurrencyCode::new(c), r))
            .collect();
        PriceCatalog::new(crypto, fiat, Vec::new())
    }

    fn convert(amount: f64, from: &str, to: &str) -> Result<ConversionResult, ConvertError> {
        ConversionEngine::convert_with(&sample_catalog(), &ConversionRequest::new(amount, from, to))
    }

    #[test]
    fn test_crypto_to_fiat() {
        // 2 BTC -> 196000 USD -> 196000 * 0.92 EUR
        let result = convert(2.0, "BTC", "EUR").unwrap();
        assert!((result.converted_amount - 180_320.0).abs() < 1e-9);
        assert!((result.unit_rate - 90_160.0).abs() < 1e-9);
    }

    #[test]
    fn test_fiat_to_fiat_through_pivot() {
        // 100 EUR -> 100 / 0.92 USD -> * 1.0
        let result = convert(100.0, "EUR", "USD").unwrap();
        assert!((result.converted_amount - 108.69565217391303).abs() < 1e-9);
    }

    #[test]
    fn test_crypto_to_crypto() {
        let result = convert(1.0, "BTC", "ETH").unwrap();
        assert!((result.converted_amount - 98_000.0 / 3_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_fiat_to_crypto() {
        // 149.50 JPY is exactly 1 USD
        let result = convert(149.50, "JPY", "USDT").unwrap();
        assert!((result.converted_amount - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive_codes() {
        let result = convert(1.0, "btc", "usdt").unwrap();
        assert!((result.converted_amount - 98_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_amount_still_reports_rate() {
        let zero = convert(0.0, "BTC", "EUR").unwrap();
        let unit = convert(1.0, "BTC", "EUR").unwrap();
        assert_eq!(zero.converted_amount, 0.0);
        assert_eq!(zero.unit_rate, unit.unit_rate);
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            match convert(bad, "BTC", "EUR") {
                Err(ConvertError::InvalidAmount { .. }) => {}
                other => panic!("expected InvalidAmount, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_source_fails() {
        assert_eq!(
            convert(5.0, "ZZZ", "USD"),
            Err(ConvertError::UnknownCurrency {
                code: CurrencyCode::new("ZZZ")
            })
        );
    }

    #[test]
    fn test_unknown_target_fails() {
        assert_eq!(
            convert(5.0, "BTC", "ZZZ"),
            Err(ConvertError::UnknownCurrency {
                code: CurrencyCode::new("ZZZ")
            })
        );
    }

    #[test]
    fn test_zero_priced_entry_is_unavailable_not_zero() {
        assert_eq!(
            convert(1.0, "DEAD", "USD"),
            Err(ConvertError::PriceUnavailable {
                code: CurrencyCode::new("DEAD")
            })
        );
        assert_eq!(
            convert(1.0, "USD", "DEAD"),
            Err(ConvertError::PriceUnavailable {
                code: CurrencyCode::new("DEAD")
            })
        );
    }

    #[test]
    fn test_engine_sees_only_latest_snapshot() {
        let shared = SharedCatalog::new(sample_catalog());
        let engine = ConversionEngine::new(shared.clone());

        let before = engine
            .convert(&ConversionRequest::new(1.0, "BTC", "USD"))
            .unwrap();
        assert!((before.converted_amount - 98_000.0).abs() < 1e-9);

        let crypto: HashMap<CurrencyCode, f64> = [("BTC", 100_000.0)]
            .into_iter()
            .map(|(c, p)| (CurrencyCode::new(c), p))
            .collect();
        let fiat: HashMap<CurrencyCode, f64> = [("USD", 1.0)]
            .into_iter()
            .map(|(c, r)| (CurrencyCode::new(c), r))
            .collect();
        shared.replace(PriceCatalog::new(crypto, fiat, Vec::new()));

        let after = engine
            .convert(&ConversionRequest::new(1.0, "BTC", "USD"))
            .unwrap();
        assert!((after.converted_amount - 100_000.0).abs() < 1e-9);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const PAIRS: &[(&str, &str)] = &[
            ("BTC", "EUR"),
            ("EUR", "BTC"),
            ("BTC", "ETH"),
            ("EUR", "JPY"),
            ("USDT", "USD"),
        ];

        proptest! {
            #[test]
            fn linearity(amount in 0.001f64..1e9, pair_idx in 0usize..PAIRS.len()) {
                let (from, to) = PAIRS[pair_idx];
                let catalog = sample_catalog();
                let full = ConversionEngine::convert_with(
                    &catalog,
                    &ConversionRequest::new(amount, from, to),
                ).unwrap();
                let unit = ConversionEngine::convert_with(
                    &catalog,
                    &ConversionRequest::new(1.0, from, to),
                ).unwrap();

                let expected = amount * unit.unit_rate;
                prop_assert!((full.converted_amount - expected).abs() <= expected.abs() * 1e-9);
            }

            #[test]
            fn round_trip(amount in 0.001f64..1e9, pair_idx in 0usize..PAIRS.len()) {
                let (from, to) = PAIRS[pair_idx];
                let catalog = sample_catalog();
                let there = ConversionEngine::convert_with(
                    &catalog,
                    &ConversionRequest::new(amount, from, to),
                ).unwrap();
                let back = ConversionEngine::convert_with(
                    &catalog,
                    &ConversionRequest::new(there.converted_amount, to, from),
                ).unwrap();

                prop_assert!((back.converted_amount - amount).abs() <= amount * 1e-9);
            }
        }
    }
}
