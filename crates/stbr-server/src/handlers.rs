//! HTTP Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stbr_core::{
    model::AllocationRow, AssetClass, ChartSeries, FetchError, HoldingFailure, HoldingInput,
    HoldingValuation, PortfolioAnalysis, StbrError,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub price_source: String,
    pub price_source_healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct TickersQuery {
    #[serde(default = "default_asset_type")]
    pub asset_type: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartRequest {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_asset_type")]
    pub asset_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    #[serde(default)]
    pub holdings: Option<Vec<HoldingInput>>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    #[serde(flatten)]
    pub analysis: PortfolioAnalysis,
    pub rotate_out_percent: Decimal,
    /// Chart rows: valued holdings, largest first
    pub allocations: Vec<AllocationRow>,
}

fn default_symbol() -> String {
    "BTC".into()
}

fn default_asset_type() -> String {
    "crypto".into()
}

fn parse_asset_class(raw: &str) -> Result<AssetClass, ApiError> {
    raw.parse().map_err(|e: StbrError| error_response(&e))
}

/// Map an engine error onto an HTTP status and JSON body
pub fn error_response(err: &StbrError) -> ApiError {
    let (status, code) = match err {
        StbrError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        StbrError::EmptyData { .. } => (StatusCode::BAD_REQUEST, "NO_DATA"),
        StbrError::InsufficientHistory { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_HISTORY"),
        StbrError::DataFormat(_) => (StatusCode::BAD_GATEWAY, "DATA_FORMAT"),
        StbrError::Fetch(FetchError::RateLimited { .. }) => {
            (StatusCode::SERVICE_UNAVAILABLE, "RATE_LIMITED")
        }
        StbrError::Fetch(FetchError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "FETCH_TIMEOUT"),
        StbrError::Fetch(_) => (StatusCode::BAD_GATEWAY, "FETCH_FAILED"),
        StbrError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        price_source: state.analyzer.source_name().to_string(),
        price_source_healthy: state.analyzer.health_check().await,
    })
}

/// Suggested tickers for an asset class, optionally filtered by prefix
pub async fn list_tickers(
    State(state): State<AppState>,
    Query(query): Query<TickersQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let asset_class = parse_asset_class(&query.asset_type)?;
    let tickers = match query.prefix.as_deref() {
        Some(prefix) => state
            .catalog
            .search(asset_class, prefix)
            .into_iter()
            .map(String::from)
            .collect(),
        None => state.catalog.tickers(asset_class).to_vec(),
    };
    Ok(Json(tickers))
}

/// Price and STBR history for one symbol
pub async fn chart_data(
    State(state): State<AppState>,
    Json(payload): Json<ChartRequest>,
) -> Result<Json<ChartSeries>, ApiError> {
    let asset_class = parse_asset_class(&payload.asset_type)?;

    let chart = state
        .analyzer
        .chart_series(&payload.symbol, asset_class)
        .await
        .map_err(|e| {
            tracing::warn!("Chart request for {} failed: {}", payload.symbol, e);
            error_response(&e)
        })?;

    Ok(Json(chart))
}

/// Value a single holding
pub async fn analyze_holding(
    State(state): State<AppState>,
    Json(payload): Json<HoldingInput>,
) -> Result<Json<HoldingValuation>, (StatusCode, Json<HoldingFailure>)> {
    state
        .analyzer
        .analyze_holding(&payload)
        .await
        .map(Json)
        .map_err(|failure| {
            let status = if failure.retryable {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(failure))
        })
}

/// Analyze a whole portfolio
pub async fn analyze_portfolio(
    State(state): State<AppState>,
    Json(payload): Json<PortfolioRequest>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let holdings = payload.holdings.ok_or_else(|| {
        error_response(&StbrError::InvalidInput(
            "Invalid input: Missing holdings data.".into(),
        ))
    })?;

    let analysis = state.analyzer.analyze_portfolio(&holdings).await;

    Ok(Json(PortfolioResponse {
        rotate_out_percent: analysis.rotate_out_percent(),
        allocations: analysis.allocations(),
        analysis,
    }))
}
