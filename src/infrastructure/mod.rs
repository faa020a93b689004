//! Infrastructure - cold path only
//!
//! Non-latency-critical code:
//! - Configuration management
//! - Logging
//! - HTTP API server

pub mod api;
pub mod config;
pub mod logging;

pub use api::start_server;
pub use config::Config;
