//! Alpha Vantage Client
//!
//! Daily adjusted series for equities, daily digital-currency series
//! (USD market) for crypto.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{PriceSource, RawSeries};
use crate::config::StbrConfig;
use crate::error::{FetchError, Result, StbrError};
use crate::model::AssetClass;

const PROVIDER: &str = "alphavantage";

pub struct AlphaVantageClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AlphaVantageClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Create from configuration; fails when no API key is set
    pub fn from_config(config: &StbrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StbrError::Config("ALPHA_VANTAGE_API_KEY is not set".into()))?;
        Self::new(api_key, config.base_url.clone(), config.fetch_timeout())
    }

    fn query(&self, symbol: &str, asset_class: AssetClass) -> Result<Vec<(&'static str, String)>> {
        let mut params = match asset_class {
            AssetClass::Stock => vec![
                ("function", "TIME_SERIES_DAILY_ADJUSTED".to_string()),
                ("symbol", symbol.to_string()),
                ("outputsize", "full".to_string()),
            ],
            AssetClass::Crypto => vec![
                ("function", "DIGITAL_CURRENCY_DAILY".to_string()),
                ("symbol", symbol.to_string()),
                ("market", "USD".to_string()),
            ],
            AssetClass::Cash => {
                return Err(StbrError::InvalidInput("cash is not fetched from a provider".into()))
            }
        };
        params.push(("apikey", self.api_key.clone()));
        Ok(params)
    }

    fn transport_error(&self, err: reqwest::Error) -> StbrError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs()).into()
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl PriceSource for AlphaVantageClient {
    async fn fetch_daily(&self, symbol: &str, asset_class: AssetClass) -> Result<RawSeries> {
        let params = self.query(symbol, asset_class)?;
        tracing::debug!(symbol, %asset_class, "Requesting daily series from Alpha Vantage");

        let response = self
            .http
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                provider: PROVIDER.into(),
                message: format!("HTTP {}", status),
            }
            .into());
        }
        if !status.is_success() {
            return Err(FetchError::Provider {
                provider: PROVIDER.into(),
                message: format!("returned status {}", status),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        parse_payload(&body)
    }

    async fn health_check(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(e) => {
                tracing::warn!("Alpha Vantage health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Extract the time series from an Alpha Vantage JSON body.
///
/// Provider notices come back with HTTP 200, so the body is checked for
/// `Note`, `Information` and `Error Message` before looking for the
/// `Time Series ...` object.
pub fn parse_payload(body: &str) -> Result<RawSeries> {
    let payload: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| StbrError::DataFormat(format!("response is not a JSON object: {}", e)))?;

    if let Some(note) = payload.get("Note") {
        return Err(rate_limited(note));
    }
    if let Some(message) = payload.get("Error Message") {
        return Err(provider_error(message));
    }
    if let Some(info) = payload.get("Information") {
        let text = info.as_str().unwrap_or_default().to_lowercase();
        if text.contains("rate limit") || text.contains("call frequency") {
            return Err(rate_limited(info));
        }
        return Err(provider_error(info));
    }

    let series = payload
        .iter()
        .find(|(key, _)| key.starts_with("Time Series"))
        .map(|(_, value)| value)
        .ok_or_else(|| {
            let keys: Vec<&String> = payload.keys().collect();
            StbrError::DataFormat(format!("no time series in response; keys: {:?}", keys))
        })?;

    serde_json::from_value(series.clone())
        .map_err(|e| StbrError::DataFormat(format!("malformed time series: {}", e)))
}

fn message_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}

fn rate_limited(value: &Value) -> StbrError {
    FetchError::RateLimited {
        provider: PROVIDER.into(),
        message: message_text(value),
    }
    .into()
}

fn provider_error(value: &Value) -> StbrError {
    FetchError::Provider {
        provider: PROVIDER.into(),
        message: message_text(value),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock_payload() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {"4. close": "160.10", "5. adjusted close": "158.00"},
                "2024-01-02": {"4. close": "159.00", "5. adjusted close": "157.00"}
            }
        }"#;
        let raw = parse_payload(body).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw["2024-01-02"]["5. adjusted close"], "157.00");
    }

    #[test]
    fn test_parse_crypto_payload() {
        let body = r#"{
            "Meta Data": {},
            "Time Series (Digital Currency Daily)": {
                "2024-01-02": {"4. close": "45000.00"}
            }
        }"#;
        let raw = parse_payload(body).unwrap();
        assert!(raw.contains_key("2024-01-02"));
    }

    #[test]
    fn test_rate_limit_note() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let err = parse_payload(body).unwrap_err();
        assert!(err.is_rate_limited());

        let body = r#"{"Information": "We have detected your API key and our standard API rate limit is 25 requests per day."}"#;
        assert!(parse_payload(body).unwrap_err().is_rate_limited());
    }

    #[test]
    fn test_bad_symbol_is_provider_error() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let err = parse_payload(body).unwrap_err();
        assert!(matches!(err, StbrError::Fetch(FetchError::Provider { .. })));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_unrecognized_body() {
        assert!(matches!(parse_payload("<html>"), Err(StbrError::DataFormat(_))));
        assert!(matches!(
            parse_payload(r#"{"Meta Data": {}}"#),
            Err(StbrError::DataFormat(_))
        ));
    }

    #[test]
    fn test_cash_is_never_queried() {
        let client =
            AlphaVantageClient::new("demo", "http://localhost", Duration::from_secs(1)).unwrap();
        assert!(client.query("CASH", AssetClass::Cash).is_err());
        let params = client.query("IBM", AssetClass::Stock).unwrap();
        assert!(params.contains(&("outputsize", "full".to_string())));
    }
}
