//! Core types: currency codes, the price catalog, market stats, formatting

pub mod catalog;
pub mod currency;
pub mod format;
pub mod market;

pub use catalog::{CatalogError, PriceCatalog, SharedCatalog};
pub use currency::{CurrencyCode, CurrencyKind};
pub use format::format_price;
pub use market::MarketEntry;
