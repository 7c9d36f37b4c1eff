//! Application State

use std::sync::Arc;

use stbr_core::{StbrAnalyzer, TickerCatalog};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Fetch → normalize → STBR pipeline
    pub analyzer: Arc<StbrAnalyzer>,

    /// Suggested tickers per asset class
    pub catalog: Arc<TickerCatalog>,
}
