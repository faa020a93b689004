//! Currency code handling
//!
//! Codes are tickers ("BTC") or ISO strings ("EUR"), normalized to
//! uppercase on entry so feed casing never leaks into lookups.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Uppercase ticker/ISO identifier for a tradeable unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a code, normalizing to uppercase
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    /// Code as string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// Allows HashMap<CurrencyCode, _> lookups by &str
impl Borrow<str> for CurrencyCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Classification of a currency code against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyKind {
    /// Present in the crypto price table (quoted as USD per unit)
    Crypto,
    /// Present in the fiat rate table (quoted as units per USD)
    Fiat,
    /// Present in neither table
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_normalization() {
        assert_eq!(CurrencyCode::new("btc").as_str(), "BTC");
        assert_eq!(CurrencyCode::new(" eur ").as_str(), "EUR");
        assert_eq!(CurrencyCode::new("USDT").as_str(), "USDT");
    }

    #[test]
    fn test_code_equality_after_normalization() {
        assert_eq!(CurrencyCode::new("btc"), CurrencyCode::new("BTC"));
    }

    #[test]
    fn test_borrow_str_lookup() {
        use std::collections::HashMap;
        let mut map: HashMap<CurrencyCode, f64> = HashMap::new();
        map.insert(CurrencyCode::new("BTC"), 98000.0);
        assert_eq!(map.get("BTC"), Some(&98000.0));
    }
}
