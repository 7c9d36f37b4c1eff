//! Ticker Catalog
//!
//! Suggested tickers per asset class, offered to clients as quick picks.

use std::collections::HashMap;

use crate::model::AssetClass;

const STOCKS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BRK-B", "JPM", "JNJ", "V", "PG",
    "UNH", "HD", "MA", "BAC", "DIS", "PYPL", "NFLX", "CRM",
];

const CRYPTOS: &[&str] = &[
    "BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "SHIB", "AVAX", "DOT", "MATIC", "LTC", "TRX",
    "LINK", "BCH", "XLM", "ATOM", "NEAR", "ALGO", "VET", "ICP",
];

/// Immutable ticker lists keyed by asset class
#[derive(Clone, Debug)]
pub struct TickerCatalog {
    tickers: HashMap<AssetClass, Vec<String>>,
}

impl Default for TickerCatalog {
    fn default() -> Self {
        Self::new([
            (AssetClass::Stock, STOCKS.iter().map(|s| s.to_string()).collect()),
            (AssetClass::Crypto, CRYPTOS.iter().map(|s| s.to_string()).collect()),
            (AssetClass::Cash, vec!["CASH".to_string()]),
        ])
    }
}

impl TickerCatalog {
    pub fn new(tickers: impl IntoIterator<Item = (AssetClass, Vec<String>)>) -> Self {
        Self {
            tickers: tickers.into_iter().collect(),
        }
    }

    pub fn tickers(&self, asset_class: AssetClass) -> &[String] {
        self.tickers
            .get(&asset_class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tickers starting with `prefix`, case-insensitive
    pub fn search(&self, asset_class: AssetClass, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_uppercase();
        self.tickers(asset_class)
            .iter()
            .filter(|t| t.starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }
}
