//! Periodic catalog refresh
//!
//! One background task owns the refresh cycle: fetch crypto and fiat
//! concurrently, substitute the static fallback for whichever feed
//! failed, assemble a complete catalog, and swap it in wholesale. Cycles
//! run sequentially within the task, so they never overlap.

use crate::core::{CurrencyCode, PriceCatalog, SharedCatalog};
use crate::feeds::{CryptoFeed, CryptoSnapshot, FiatRateClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Refresh cycle counters, exported via the status endpoint
///
/// Thread-safe: written by the refresh task, snapshotted by API handlers.
pub struct RefreshStatus {
    /// Completed refresh cycles
    cycles: AtomicU64,
    /// Last cycle used the static crypto table
    crypto_fallback: AtomicBool,
    /// Last cycle used the static fiat table
    fiat_fallback: AtomicBool,
    /// Last completed cycle (Unix millis), 0 before the first
    last_refresh_ms: AtomicU64,
}

/// Status snapshot for API export
#[derive(Debug, Clone, Copy)]
pub struct RefreshSnapshot {
    pub cycles: u64,
    pub crypto_fallback: bool,
    pub fiat_fallback: bool,
    pub last_refresh_ms: u64,
}

impl RefreshStatus {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            crypto_fallback: AtomicBool::new(false),
            fiat_fallback: AtomicBool::new(false),
            last_refresh_ms: AtomicU64::new(0),
        }
    }

    fn record_cycle(&self, crypto_fallback: bool, fiat_fallback: bool) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.crypto_fallback.store(crypto_fallback, Ordering::Relaxed);
        self.fiat_fallback.store(fiat_fallback, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_refresh_ms.store(now, Ordering::Relaxed);
    }

    /// Get current snapshot of the status
    pub fn snapshot(&self) -> RefreshSnapshot {
        RefreshSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            crypto_fallback: self.crypto_fallback.load(Ordering::Relaxed),
            fiat_fallback: self.fiat_fallback.load(Ordering::Relaxed),
            last_refresh_ms: self.last_refresh_ms.load(Ordering::Relaxed),
        }
    }
}

impl Default for RefreshStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Recurring refresh task over the configured crypto feed
pub struct Refresher {
    catalog: SharedCatalog,
    crypto_feed: CryptoFeed,
    fiat_client: FiatRateClient,
    status: Arc<RefreshStatus>,
    interval: Duration,
}

impl Refresher {
    pub fn new(catalog: SharedCatalog, crypto_feed: CryptoFeed, interval: Duration) -> Self {
        Self {
            catalog,
            crypto_feed,
            fiat_client: FiatRateClient::new(),
            status: Arc::new(RefreshStatus::new()),
            interval,
        }
    }

    /// Shared handle to the cycle status
    pub fn status(&self) -> Arc<RefreshStatus> {
        self.status.clone()
    }

    /// One refresh cycle
    ///
    /// Both fetches run concurrently. A failed fetch is replaced by the
    /// static fallback for that side, so the assembled catalog is always
    /// complete and the failure never propagates upward.
    pub async fn refresh_once(&self) {
        let (crypto_result, fiat_result) = tokio::join!(
            self.crypto_feed.fetch_crypto(),
            self.fiat_client.fetch_rates()
        );

        let (crypto, crypto_fallback) = match crypto_result {
            Ok(snapshot) => (snapshot, false),
            Err(e) => {
                tracing::warn!(
                    target: "feed",
                    "{} fetch failed, using fallback prices: {}",
                    self.crypto_feed.name(),
                    e
                );
                (self.crypto_feed.fallback_snapshot(), true)
            }
        };

        let (fiat, fiat_fallback) = match fiat_result {
            Ok(rates) => (rates, false),
            Err(e) => {
                tracing::warn!(target: "feed", "Fiat fetch failed, using fallback rates: {}", e);
                (FiatRateClient::fallback_rates(), true)
            }
        };

        let catalog = assemble(crypto, fiat);
        tracing::info!(
            target: "feed",
            "Catalog refreshed: {} cryptos, {} fiats (crypto fallback: {}, fiat fallback: {})",
            catalog.crypto_count(),
            catalog.fiat_count(),
            crypto_fallback,
            fiat_fallback
        );

        self.catalog.replace(catalog);
        self.status.record_cycle(crypto_fallback, fiat_fallback);
    }

    /// Run forever on the configured interval
    ///
    /// The first tick fires immediately, so the catalog goes from empty
    /// to populated within one cycle of startup.
    pub async fn run(&self) {
        tracing::info!(
            "Refresher running: source {}, every {:?}",
            self.crypto_feed.name(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            self.refresh_once().await;
        }
    }
}

/// Assemble a complete catalog from one cycle's feed data
fn assemble(crypto: CryptoSnapshot, fiat: HashMap<CurrencyCode, f64>) -> PriceCatalog {
    PriceCatalog::new(crypto.prices, fiat, crypto.markets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CurrencyKind;

    #[test]
    fn test_assemble_from_fallback_pieces() {
        let catalog = assemble(CryptoSnapshot::fallback(), FiatRateClient::fallback_rates());
        assert!(!catalog.is_empty());
        assert_eq!(
            catalog.classify(&CurrencyCode::new("BTC")),
            CurrencyKind::Crypto
        );
        assert_eq!(
            catalog.classify(&CurrencyCode::new("EUR")),
            CurrencyKind::Fiat
        );
        assert_eq!(catalog.price_in_usd(&CurrencyCode::new("USDT")), Ok(1.0));
    }

    #[test]
    fn test_status_records_cycles() {
        let status = RefreshStatus::new();
        assert_eq!(status.snapshot().cycles, 0);
        assert_eq!(status.snapshot().last_refresh_ms, 0);

        status.record_cycle(true, false);
        let snap = status.snapshot();
        assert_eq!(snap.cycles, 1);
        assert!(snap.crypto_fallback);
        assert!(!snap.fiat_fallback);
        assert!(snap.last_refresh_ms > 0);

        status.record_cycle(false, false);
        let snap = status.snapshot();
        assert_eq!(snap.cycles, 2);
        assert!(!snap.crypto_fallback);
    }

    #[test]
    fn test_refresher_swap_visible_through_shared_handle() {
        let shared = SharedCatalog::new(PriceCatalog::empty());
        assert!(shared.snapshot().is_empty());

        // Simulate what a fallback cycle applies
        shared.replace(assemble(
            CryptoSnapshot::fallback(),
            FiatRateClient::fallback_rates(),
        ));
        assert!(!shared.snapshot().is_empty());
    }
}
