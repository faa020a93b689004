//! Crypto/fiat converter service
//!
//! # Architecture
//! - **core**: catalog, currency codes, market stats, formatting
//! - **engine**: USD-pivot conversion
//! - **feeds**: crypto price loaders (CoinGecko / Binance) and fiat rates
//! - **refresh**: periodic catalog refresh with fallback substitution
//! - **infrastructure**: cold path (logging, config, api)

use anyhow::Context;
use coinfx::feeds::{CryptoFeed, FeedSource};
use coinfx::infrastructure::{config::Config, logging::init_logging, start_server};
use coinfx::refresh::Refresher;
use coinfx::{FxError, PriceCatalog, SharedCatalog};
use std::time::Duration;

/// Main application state
pub struct ConverterApp {
    config: Config,
}

impl ConverterApp {
    /// Create new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the main event loop
    pub async fn run(&self) -> Result<(), FxError> {
        tracing::info!("Starting converter service...");

        // 1. Shared catalog, empty until the first refresh lands
        let catalog = SharedCatalog::new(PriceCatalog::empty());

        // 2. Configured crypto feed
        let source: FeedSource = self
            .config
            .feed
            .source
            .parse()
            .map_err(FxError::Config)?;
        let feed = CryptoFeed::from_source(source, self.config.feed.market_depth);

        let refresher = Refresher::new(
            catalog.clone(),
            feed,
            Duration::from_secs(self.config.feed.refresh_secs),
        );

        // 3. Start API server (cold path)
        let catalog_for_api = catalog.clone();
        let status_for_api = refresher.status();
        let api_config = self.config.api.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(catalog_for_api, status_for_api, source, &api_config).await
            {
                tracing::error!("API Server failed: {}", e);
            }
        });

        // 4. Run the refresh loop (this blocks the task)
        refresher.run().await;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep guards alive so buffered log lines flush on shutdown
    let _guards = init_logging();

    let config = Config::load().context("loading config.toml")?;

    let app = ConverterApp::new(config);
    app.run().await.context("running converter service")?;

    Ok(())
}
