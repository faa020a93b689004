//! Price catalog: the in-memory snapshot of all known prices and rates
//!
//! Two disjoint tables with opposite quote directions:
//! - crypto prices are USD per one unit of the coin
//! - fiat rates are units of the fiat per one USD
//!
//! A snapshot is immutable once built. Refreshes build a new catalog and
//! swap it into [`SharedCatalog`] wholesale, so readers always see either
//! the old complete snapshot or the new one.

use crate::core::currency::{CurrencyCode, CurrencyKind};
use crate::core::market::MarketEntry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Static crypto prices used when the market feed is down
pub const FALLBACK_CRYPTO_PRICES: &[(&str, f64)] = &[
    ("BTC", 98_000.0),
    ("ETH", 3_500.0),
    ("USDT", 1.0),
    ("BNB", 650.0),
    ("SOL", 210.0),
    ("XRP", 0.62),
    ("ADA", 0.58),
    ("DOGE", 0.38),
    ("AVAX", 42.0),
    ("DOT", 7.2),
    ("MATIC", 0.89),
    ("LINK", 19.0),
    ("UNI", 12.0),
    ("LTC", 105.0),
    ("BCH", 480.0),
];

/// Static per-USD fiat rates used when the rate feed is down
pub const FALLBACK_FIAT_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("CNY", 7.24),
    ("JPY", 149.50),
    ("GBP", 0.79),
    ("KRW", 1_320.0),
    ("AUD", 1.52),
    ("CAD", 1.36),
    ("CHF", 0.88),
    ("HKD", 7.82),
    ("SGD", 1.34),
    ("RUB", 92.0),
    ("INR", 83.0),
    ("BRL", 4.97),
    ("ZAR", 18.50),
    ("TRY", 28.50),
    ("MXN", 17.20),
    ("IDR", 15_600.0),
    ("THB", 35.50),
    ("VND", 24_500.0),
];

/// Catalog lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Code absent from both tables
    #[error("Unknown currency: {code}")]
    Unknown { code: CurrencyCode },

    /// Code present but its stored value is non-finite or non-positive
    #[error("Price unavailable for {code}")]
    Unpriced { code: CurrencyCode },
}

/// Immutable snapshot of known crypto prices and fiat rates
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    /// USD price per one unit of each crypto
    crypto_prices: HashMap<CurrencyCode, f64>,
    /// Units of each fiat per one USD
    fiat_rates: HashMap<CurrencyCode, f64>,
    /// Market display stats from the same refresh cycle, descending weight
    markets: Vec<MarketEntry>,
    /// When this snapshot was built
    updated_at: SystemTime,
}

/// A stored value counts as priced only if it is a positive finite number
#[inline]
fn is_priced(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl PriceCatalog {
    /// Build a snapshot from feed data
    ///
    /// Force-sets the two anchors regardless of feed content:
    /// `USDT` is pegged at exactly 1 USD and `USD` is the pivot itself.
    pub fn new(
        crypto_prices: HashMap<CurrencyCode, f64>,
        fiat_rates: HashMap<CurrencyCode, f64>,
        markets: Vec<MarketEntry>,
    ) -> Self {
        let mut crypto_prices = crypto_prices;
        let mut fiat_rates = fiat_rates;
        crypto_prices.insert(CurrencyCode::new("USDT"), 1.0);
        fiat_rates.insert(CurrencyCode::new("USD"), 1.0);

        Self {
            crypto_prices,
            fiat_rates,
            markets,
            updated_at: SystemTime::now(),
        }
    }

    /// Empty snapshot for startup, before the first refresh lands
    ///
    /// Deliberately not anchor-seeded: an empty catalog classifies every
    /// code as Unknown, so conversions fail loudly instead of quoting a
    /// catalog that has no feed behind it yet.
    pub fn empty() -> Self {
        Self {
            crypto_prices: HashMap::new(),
            fiat_rates: HashMap::new(),
            markets: Vec::new(),
            updated_at: SystemTime::now(),
        }
    }

    /// Full static snapshot used when every feed is down
    ///
    /// Wholly replaces the previous catalog, never merges into it.
    pub fn fallback() -> Self {
        let crypto = FALLBACK_CRYPTO_PRICES
            .iter()
            .map(|&(code, price)| (CurrencyCode::new(code), price))
            .collect();
        let fiat = FALLBACK_FIAT_RATES
            .iter()
            .map(|&(code, rate)| (CurrencyCode::new(code), rate))
            .collect();
        let markets = FALLBACK_CRYPTO_PRICES
            .iter()
            .map(|&(code, price)| MarketEntry::placeholder(CurrencyCode::new(code), price))
            .collect();
        Self::new(crypto, fiat, markets)
    }

    /// Classify a code by table presence
    ///
    /// Presence-based on purpose: an entry with a bad stored value is
    /// still "known", it just fails later as unpriced. Crypto is checked
    /// first, so a ticker colliding across both tables resolves as crypto.
    pub fn classify(&self, code: &CurrencyCode) -> CurrencyKind {
        if self.crypto_prices.contains_key(code.as_str()) {
            CurrencyKind::Crypto
        } else if self.fiat_rates.contains_key(code.as_str()) {
            CurrencyKind::Fiat
        } else {
            CurrencyKind::Unknown
        }
    }

    /// USD price of one unit of a crypto, as stored
    pub fn usd_price_per_unit(&self, code: &CurrencyCode) -> Option<f64> {
        self.crypto_prices.get(code.as_str()).copied()
    }

    /// Units of a fiat per one USD, as stored
    pub fn units_per_usd(&self, code: &CurrencyCode) -> Option<f64> {
        self.fiat_rates.get(code.as_str()).copied()
    }

    /// Validated USD price per unit of a crypto
    ///
    /// `Unknown` if the code is not in the crypto table, `Unpriced` if the
    /// stored value is non-finite or non-positive.
    pub fn priced_usd_per_unit(&self, code: &CurrencyCode) -> Result<f64, CatalogError> {
        match self.crypto_prices.get(code.as_str()) {
            Some(&price) if is_priced(price) => Ok(price),
            Some(_) => Err(CatalogError::Unpriced { code: code.clone() }),
            None => Err(CatalogError::Unknown { code: code.clone() }),
        }
    }

    /// Validated per-USD rate of a fiat
    pub fn priced_units_per_usd(&self, code: &CurrencyCode) -> Result<f64, CatalogError> {
        match self.fiat_rates.get(code.as_str()) {
            Some(&rate) if is_priced(rate) => Ok(rate),
            Some(_) => Err(CatalogError::Unpriced { code: code.clone() }),
            None => Err(CatalogError::Unknown { code: code.clone() }),
        }
    }

    /// USD value of one unit of any known currency
    ///
    /// Crypto prices are already USD per unit. Fiat rates are units per
    /// USD, so the USD value of one fiat unit is the inverse.
    pub fn price_in_usd(&self, code: &CurrencyCode) -> Result<f64, CatalogError> {
        match self.classify(code) {
            CurrencyKind::Crypto => self.priced_usd_per_unit(code),
            CurrencyKind::Fiat => Ok(1.0 / self.priced_units_per_usd(code)?),
            CurrencyKind::Unknown => Err(CatalogError::Unknown { code: code.clone() }),
        }
    }

    /// Market entries from this snapshot, descending weight
    pub fn markets(&self) -> &[MarketEntry] {
        &self.markets
    }

    /// Known crypto codes, sorted
    pub fn crypto_codes(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.crypto_prices.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Known fiat codes, sorted
    pub fn fiat_codes(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.fiat_rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn crypto_count(&self) -> usize {
        self.crypto_prices.len()
    }

    pub fn fiat_count(&self) -> usize {
        self.fiat_rates.len()
    }

    /// True until the first refresh populates both tables
    pub fn is_empty(&self) -> bool {
        self.crypto_prices.is_empty() || self.fiat_rates.is_empty()
    }

    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }
}

/// Swappable handle to the current catalog snapshot
///
/// Readers take an `Arc` clone and compute against that snapshot; the
/// refresher replaces the whole `Arc`. A conversion therefore never sees
/// a half-updated mix of crypto and fiat tables.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<PriceCatalog>>>,
}

impl SharedCatalog {
    pub fn new(catalog: PriceCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<PriceCatalog> {
        self.inner.read().clone()
    }

    /// Atomically replace the snapshot wholesale
    pub fn replace(&self, catalog: PriceCatalog) {
        *self.inner.write() = Arc::new(catalog);
    }
}
