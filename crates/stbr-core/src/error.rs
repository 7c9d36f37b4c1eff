//! Error Types for the STBR engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StbrError>;

#[derive(Error, Debug)]
pub enum StbrError {
    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("No price data for {symbol} on or after {start}")]
    EmptyData {
        symbol: String,
        start: chrono::NaiveDate,
    },

    #[error("Insufficient history: need {needed} samples, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures talking to the market-data provider.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Provider throttled us; try again later
    #[error("Rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    /// Provider answered but refused the request (bad symbol, bad key, ...)
    #[error("Provider error from {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Fetch timed out after {0}s")]
    Timeout(u64),

    #[error("Symbol not supported: {0}")]
    UnsupportedSymbol(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<reqwest::Error> for StbrError {
    fn from(err: reqwest::Error) -> Self {
        StbrError::Fetch(FetchError::Network(err))
    }
}

impl StbrError {
    /// True when the provider asked us to back off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StbrError::Fetch(FetchError::RateLimited { .. }))
    }

    /// Check if the same request could succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StbrError::Fetch(
                FetchError::RateLimited { .. } | FetchError::Timeout(_) | FetchError::Network(_)
            )
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            StbrError::DataFormat(_) => {
                "The market data provider returned data in an unexpected format.".into()
            }
            StbrError::EmptyData { symbol, .. } => format!("No price data found for {}.", symbol),
            StbrError::InsufficientHistory { needed, .. } => format!(
                "Not enough historical data (need at least {} days) to calculate STBR.",
                needed
            ),
            StbrError::InvalidInput(msg) => msg.clone(),
            StbrError::Fetch(FetchError::RateLimited { .. }) => {
                "The market data provider rate limit was reached. Please try again later.".into()
            }
            StbrError::Fetch(FetchError::Timeout(_)) => {
                "The market data provider took too long to respond.".into()
            }
            StbrError::Fetch(FetchError::UnsupportedSymbol(symbol)) => {
                format!("The symbol '{}' is not supported.", symbol)
            }
            StbrError::Fetch(_) => {
                "Failed to fetch price data. Check the symbol or try again later.".into()
            }
            StbrError::Config(_) => "Service configuration error.".into(),
        }
    }
}
