//! STBR HTTP Server
//!
//! Axum-based server exposing Short Term Bubble Risk charts and portfolio
//! rotation analysis to the web frontend.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stbr_core::{
    market::{AlphaVantageClient, MockPriceSource, PriceSource},
    StbrAnalyzer, StbrConfig, StbrEngine, TickerCatalog,
};

use crate::handlers::{
    analyze_holding, analyze_portfolio, chart_data, health_check, list_tickers,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StbrConfig::from_env();

    // Real provider when a key is configured, synthetic data otherwise
    let source: Arc<dyn PriceSource> = match AlphaVantageClient::from_config(&config) {
        Ok(client) => {
            tracing::info!("✓ Using Alpha Vantage at {}", config.base_url);
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("⚠ {} - serving mock price data", e);
            tracing::warn!("  Set ALPHA_VANTAGE_API_KEY in .env");
            Arc::new(MockPriceSource::new())
        }
    };

    tracing::info!(
        "History from {}, fetch timeout {}s",
        config.start_date,
        config.fetch_timeout_secs
    );

    let state = AppState {
        analyzer: Arc::new(StbrAnalyzer::new(source, StbrEngine::default(), &config)),
        catalog: Arc::new(TickerCatalog::default()),
    };

    let app = router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 stbr-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/tickers            - Suggested tickers");
    tracing::info!("  POST /api/chart              - STBR chart series");
    tracing::info!("  POST /api/holding            - Value one holding");
    tracing::info!("  POST /api/portfolio/analyze  - Portfolio rotation analysis");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/tickers", get(list_tickers))

        // STBR API
        .route("/api/chart", post(chart_data))
        .route("/api/holding", post(analyze_holding))
        .route("/api/portfolio/analyze", post(analyze_portfolio))

        // Static files (web frontend)
        .fallback_service(ServeDir::new("static"))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
