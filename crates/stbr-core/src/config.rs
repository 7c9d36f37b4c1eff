//! Configuration
//!
//! Provider credentials, history start date and fetch timeout, loaded from
//! the environment with sane defaults.

use std::time::Duration;

use chrono::NaiveDate;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Earliest date kept by the normalizer unless configured otherwise
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

#[derive(Clone, Debug)]
pub struct StbrConfig {
    /// Alpha Vantage API key; `None` means run against the mock source
    pub api_key: Option<String>,

    pub base_url: String,

    /// Price history before this date is ignored
    pub start_date: NaiveDate,

    /// Upper bound on a single provider fetch
    pub fetch_timeout_secs: u64,
}

impl Default for StbrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            start_date: default_start_date(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl StbrConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_key = lookup("ALPHA_VANTAGE_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let base_url = lookup("ALPHA_VANTAGE_BASE_URL").unwrap_or(defaults.base_url);

        let start_date = match lookup("STBR_START_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").unwrap_or_else(|e| {
                tracing::warn!("Ignoring STBR_START_DATE={}: {}", raw, e);
                defaults.start_date
            }),
            None => defaults.start_date,
        };

        let fetch_timeout_secs = match lookup("STBR_FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!("Ignoring STBR_FETCH_TIMEOUT_SECS={}", raw);
                    defaults.fetch_timeout_secs
                }
            },
            None => defaults.fetch_timeout_secs,
        };

        Self {
            api_key,
            base_url,
            start_date,
            fetch_timeout_secs,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
