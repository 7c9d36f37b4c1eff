//! Market Data Integration
//!
//! Abstractions and implementations for daily price providers.

mod alphavantage;
mod mock;
mod normalize;

pub use alphavantage::{parse_payload, AlphaVantageClient};
pub use mock::{MockFailure, MockPriceSource};
pub use normalize::Normalizer;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::AssetClass;

/// Provider fields for one date, e.g. `"4. close" => "187.44"`
pub type RawRecord = BTreeMap<String, serde_json::Value>;

/// Provider response keyed by date string
pub type RawSeries = BTreeMap<String, RawRecord>;

/// Daily price provider (Strategy pattern)
///
/// Implement this for each market data vendor.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Full daily history for a symbol, exactly as the provider shapes it
    async fn fetch_daily(&self, symbol: &str, asset_class: AssetClass) -> Result<RawSeries>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}
