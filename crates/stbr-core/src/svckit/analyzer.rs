//! STBR Analyzer
//!
//! Fetch → normalize → compute pipeline shared by the chart and portfolio
//! operations.

use std::sync::Arc;
use std::time::Duration;

use crate::config::StbrConfig;
use crate::engine::StbrEngine;
use crate::error::{FetchError, Result};
use crate::market::{Normalizer, PriceSource};
use crate::model::{AssetClass, PriceSeries};

/// Entry point for the presentation layer
pub struct StbrAnalyzer {
    pub(crate) source: Arc<dyn PriceSource>,
    pub(crate) engine: StbrEngine,
    normalizer: Normalizer,
    fetch_timeout: Duration,
}

impl StbrAnalyzer {
    pub fn new(source: Arc<dyn PriceSource>, engine: StbrEngine, config: &StbrConfig) -> Self {
        Self {
            source,
            engine,
            normalizer: Normalizer::new(config.start_date),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Standard band table and default configuration
    pub fn with_source(source: Arc<dyn PriceSource>) -> Self {
        Self::new(source, StbrEngine::default(), &StbrConfig::default())
    }

    pub fn engine(&self) -> &StbrEngine {
        &self.engine
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn health_check(&self) -> bool {
        self.source.health_check().await
    }

    /// Fetch and normalize the daily closes for a symbol.
    ///
    /// The provider call is bounded by the configured fetch timeout.
    pub async fn price_series(&self, symbol: &str, asset_class: AssetClass) -> Result<PriceSeries> {
        let raw = tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_daily(symbol, asset_class),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.fetch_timeout.as_secs()))??;

        let series = self.normalizer.normalize(symbol, asset_class, &raw)?;
        tracing::debug!(
            symbol,
            points = series.len(),
            source = self.source.name(),
            "Normalized price series"
        );
        Ok(series)
    }
}
