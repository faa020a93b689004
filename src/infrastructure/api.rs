//! API Server (Cold Path)
//!
//! JSON surface consumed by the converter UI. Handlers read the shared
//! catalog snapshot; nothing here mutates it.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::core::{format_price, MarketEntry, SharedCatalog};
use crate::engine::{ConversionEngine, ConversionRequest, ConvertError};
use crate::feeds::FeedSource;
use crate::infrastructure::config::ApiConfig;
use crate::refresh::RefreshStatus;
use crate::FxError;

/// Conversion response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionDto {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub converted_amount: f64,
    pub unit_rate: f64,
    /// Display-formatted converted amount
    pub formatted_amount: String,
    /// Display-formatted per-unit rate
    pub formatted_rate: String,
}

/// Market entry response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDto {
    pub symbol: String,
    pub price_usd: f64,
    pub formatted_price: String,
    pub change_24h_abs: f64,
    pub change_24h_percent: f64,
    pub volume_24h: f64,
}

impl From<&MarketEntry> for MarketDto {
    fn from(entry: &MarketEntry) -> Self {
        Self {
            symbol: entry.symbol.to_string(),
            price_usd: entry.price_usd,
            formatted_price: format_price(entry.price_usd),
            change_24h_abs: entry.change_24h_abs,
            change_24h_percent: entry.change_24h_percent,
            volume_24h: entry.volume_24h,
        }
    }
}

/// Known currencies response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrenciesDto {
    pub crypto: Vec<String>,
    pub fiat: Vec<String>,
}

/// System status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub source: String,
    pub catalog_ready: bool,
    pub crypto_count: usize,
    pub fiat_count: usize,
    pub refresh_cycles: u64,
    pub crypto_fallback: bool,
    pub fiat_fallback: bool,
    /// Unix millis of the last completed refresh, 0 before the first
    pub last_refresh_ms: u64,
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub error: String,
    pub code: &'static str,
}

/// Conversion failure mapped to an HTTP response
#[derive(Debug)]
pub struct ApiError(ConvertError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ConvertError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
            ConvertError::UnknownCurrency { .. } => StatusCode::NOT_FOUND,
            ConvertError::PriceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self.0 {
            ConvertError::InvalidAmount { .. } => "invalidAmount",
            ConvertError::UnknownCurrency { .. } => "unknownCurrency",
            ConvertError::PriceUnavailable { .. } => "priceUnavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorDto {
            error: self.0.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: SharedCatalog,
    pub status: Arc<RefreshStatus>,
    pub source: FeedSource,
}

/// Start the API server
pub async fn start_server(
    catalog: SharedCatalog,
    status: Arc<RefreshStatus>,
    source: FeedSource,
    config: &ApiConfig,
) -> Result<(), FxError> {
    let state = AppState {
        catalog,
        status,
        source,
    };

    let app = Router::new()
        .route("/api/convert", get(get_convert))
        .route("/api/markets", get(get_markets))
        .route("/api/currencies", get(get_currencies))
        .route("/api/status", get(get_status))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(target: "api", "API Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(FxError::Io)?;

    axum::serve(listener, app).await.map_err(FxError::Io)?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    /// Absent or empty means zero: the response still carries the rate
    amount: Option<String>,
    from: String,
    to: String,
}

/// Parse the amount query parameter the way the input field behaves:
/// missing or empty is a zero-amount rate query, garbage is an error
fn parse_amount(raw: &Option<String>) -> Result<f64, ConvertError> {
    match raw.as_deref() {
        None | Some("") => Ok(0.0),
        Some(text) => text
            .parse::<f64>()
            .map_err(|_| ConvertError::InvalidAmount { value: f64::NAN }),
    }
}

/// Handler for /api/convert
async fn get_convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<ConversionDto>, ApiError> {
    let amount = parse_amount(&query.amount).map_err(ApiError)?;
    let request = ConversionRequest::new(amount, &query.from, &query.to);

    let snapshot = state.catalog.snapshot();
    let result = ConversionEngine::convert_with(&snapshot, &request).map_err(ApiError)?;

    Ok(Json(ConversionDto {
        amount,
        from: request.from.to_string(),
        to: request.to.to_string(),
        converted_amount: result.converted_amount,
        unit_rate: result.unit_rate,
        formatted_amount: format_price(result.converted_amount),
        formatted_rate: format_price(result.unit_rate),
    }))
}

#[derive(Debug, Deserialize)]
struct MarketsQuery {
    limit: Option<usize>,
}

/// Handler for /api/markets
/// Returns the top entries of the current snapshot, descending weight
async fn get_markets(
    State(state): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Json<Vec<MarketDto>> {
    let limit = query.limit.unwrap_or(5);
    let snapshot = state.catalog.snapshot();

    let dtos: Vec<MarketDto> = snapshot.markets().iter().take(limit).map(MarketDto::from).collect();

    Json(dtos)
}

/// Handler for /api/currencies
/// Known codes for dropdown population, sorted
async fn get_currencies(State(state): State<AppState>) -> Json<CurrenciesDto> {
    let snapshot = state.catalog.snapshot();

    Json(CurrenciesDto {
        crypto: snapshot
            .crypto_codes()
            .into_iter()
            .map(|c| c.to_string())
            .collect(),
        fiat: snapshot
            .fiat_codes()
            .into_iter()
            .map(|c| c.to_string())
            .collect(),
    })
}

/// Handler for /api/status
async fn get_status(State(state): State<AppState>) -> Json<StatusDto> {
    let snapshot = state.catalog.snapshot();
    let refresh = state.status.snapshot();

    Json(StatusDto {
        source: state.source.name().to_string(),
        catalog_ready: !snapshot.is_empty(),
        crypto_count: snapshot.crypto_count(),
        fiat_count: snapshot.fiat_count(),
        refresh_cycles: refresh.cycles,
        crypto_fallback: refresh.crypto_fallback,
        fiat_fallback: refresh.fiat_fallback,
        last_refresh_ms: refresh.last_refresh_ms,
    })
}
