//! Crypto/fiat currency converter
//!
//! Core library for USD-pivot conversion over live price feeds.

pub mod core;
pub mod engine;
pub mod feeds;
pub mod infrastructure;
pub mod refresh;

// Re-export commonly used types
pub use crate::core::{CurrencyCode, CurrencyKind, PriceCatalog, SharedCatalog};
pub use engine::{ConversionEngine, ConversionRequest, ConversionResult, ConvertError};
pub use infrastructure::config::{ApiConfig, Config, FeedConfig};

use thiserror::Error;

/// Main error type for the converter service
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Feed error: {0}")]
    Feed(String),

    #[error("API server error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FxError>;
