//! Data Normalizer
//!
//! Turns a provider-shaped daily series into a [`PriceSeries`] of closes.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::RawSeries;
use crate::config::default_start_date;
use crate::error::{Result, StbrError};
use crate::model::{AssetClass, PricePoint, PriceSeries};

const ADJUSTED_CLOSE: &str = "5. adjusted close";
const CLOSE: &str = "4. close";
const CRYPTO_USD_CLOSE: &str = "4b. close (USD)";

/// Normalizes raw provider series, keeping dates on or after `start_date`.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
    start_date: NaiveDate,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(default_start_date())
    }
}

impl Normalizer {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn normalize(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        raw: &RawSeries,
    ) -> Result<PriceSeries> {
        if raw.is_empty() {
            return Err(self.empty(symbol));
        }

        let field = close_field(asset_class, raw)?;
        tracing::debug!(symbol, field, records = raw.len(), "Using close field");

        let mut points = Vec::with_capacity(raw.len());
        for (key, record) in raw {
            let date = parse_date(key)?;
            let value = record.get(field).ok_or_else(|| {
                StbrError::DataFormat(format!("record for {} has no '{}' field", key, field))
            })?;
            let close = coerce_close(value).ok_or_else(|| {
                StbrError::DataFormat(format!("'{}' on {} is not a number: {}", field, key, value))
            })?;
            points.push(PricePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        points.retain(|p| p.date >= self.start_date);

        if points.is_empty() {
            return Err(self.empty(symbol));
        }

        PriceSeries::new(points)
    }

    fn empty(&self, symbol: &str) -> StbrError {
        StbrError::EmptyData {
            symbol: symbol.to_string(),
            start: self.start_date,
        }
    }
}

/// Pick the closing-price field for the series' asset class.
fn close_field(asset_class: AssetClass, raw: &RawSeries) -> Result<&str> {
    let has = |name: &str| raw.values().any(|record| record.contains_key(name));

    let field = match asset_class {
        AssetClass::Stock => [ADJUSTED_CLOSE, CLOSE].into_iter().find(|f| has(*f)),
        AssetClass::Crypto => [CRYPTO_USD_CLOSE, CLOSE]
            .into_iter()
            .find(|f| has(*f))
            .or_else(|| {
                raw.values()
                    .flat_map(|record| record.keys())
                    .map(String::as_str)
                    .filter(|name| {
                        let lower = name.to_lowercase();
                        lower.contains("close") && lower.contains("(usd)")
                    })
                    .min()
            }),
        AssetClass::Cash => {
            return Err(StbrError::InvalidInput("cash holdings have no price series".into()))
        }
    };

    field.ok_or_else(|| {
        let mut available: Vec<&str> = raw
            .values()
            .flat_map(|record| record.keys())
            .map(String::as_str)
            .collect();
        available.sort_unstable();
        available.dedup();
        StbrError::DataFormat(format!(
            "no suitable close field for {} data; available: {:?}",
            asset_class, available
        ))
    })
}

fn parse_date(key: &str) -> Result<NaiveDate> {
    let key = key.trim();
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|e| StbrError::DataFormat(format!("invalid date '{}': {}", key, e)))
}

fn coerce_close(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::RawRecord;
    use serde_json::json;

    fn record(fields: &[(&str, Value)]) -> RawRecord {
        fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_stock_prefers_adjusted_close() {
        let mut raw = RawSeries::new();
        raw.insert(
            "2024-01-03".into(),
            record(&[(CLOSE, json!("200.0")), (ADJUSTED_CLOSE, json!("100.5"))]),
        );
        raw.insert(
            "2024-01-02".into(),
            record(&[(CLOSE, json!("198.0")), (ADJUSTED_CLOSE, json!("99.0"))]),
        );

        let series = Normalizer::default()
            .normalize("AAPL", AssetClass::Stock, &raw)
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, date(2024, 1, 2));
        assert_eq!(series.points()[0].close, 99.0);
        assert_eq!(series.points()[1].close, 100.5);
    }

    #[test]
    fn test_stock_falls_back_to_close() {
        let mut raw = RawSeries::new();
        raw.insert("2024-01-02".into(), record(&[(CLOSE, json!(12.5))]));
        let series = Normalizer::default()
            .normalize("IBM", AssetClass::Stock, &raw)
            .unwrap();
        assert_eq!(series.points()[0].close, 12.5);
    }

    #[test]
    fn test_crypto_field_search() {
        let mut raw = RawSeries::new();
        raw.insert(
            "2024-01-02".into(),
            record(&[("1a. open (USD)", json!("1.0")), ("4a. Close (USD)", json!("42000.1"))]),
        );
        let series = Normalizer::default()
            .normalize("BTC", AssetClass::Crypto, &raw)
            .unwrap();
        assert_eq!(series.points()[0].close, 42000.1);
    }

    #[test]
    fn test_unknown_schema_is_format_error() {
        let mut raw = RawSeries::new();
        raw.insert("2024-01-02".into(), record(&[("price", json!("1.0"))]));
        let err = Normalizer::default()
            .normalize("AAPL", AssetClass::Stock, &raw)
            .unwrap_err();
        assert!(matches!(err, StbrError::DataFormat(_)));
    }

    #[test]
    fn test_bad_date_and_bad_value() {
        let mut raw = RawSeries::new();
        raw.insert("yesterday".into(), record(&[(CLOSE, json!("1.0"))]));
        assert!(matches!(
            Normalizer::default().normalize("X", AssetClass::Stock, &raw),
            Err(StbrError::DataFormat(_))
        ));

        let mut raw = RawSeries::new();
        raw.insert("2024-01-02".into(), record(&[(CLOSE, json!("n/a"))]));
        assert!(matches!(
            Normalizer::default().normalize("X", AssetClass::Stock, &raw),
            Err(StbrError::DataFormat(_))
        ));
    }

    #[test]
    fn test_keys_collapsing_to_same_date() {
        let mut raw = RawSeries::new();
        raw.insert("2024-01-01".into(), record(&[(CLOSE, json!("5.0"))]));
        raw.insert("2024-01-01 00:00:00".into(), record(&[(CLOSE, json!("5.5"))]));

        let err = Normalizer::default()
            .normalize("X", AssetClass::Stock, &raw)
            .unwrap_err();
        assert!(matches!(err, StbrError::DataFormat(_)));
    }

    #[test]
    fn test_start_date_filter() {
        let mut raw = RawSeries::new();
        raw.insert("2009-12-31".into(), record(&[(CLOSE, json!("5.0"))]));
        raw.insert("2010-01-01 00:00:00".into(), record(&[(CLOSE, json!("6.0"))]));

        let series = Normalizer::default()
            .normalize("X", AssetClass::Stock, &raw)
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].date, date(2010, 1, 1));

        let late = Normalizer::new(date(2030, 1, 1)).normalize("X", AssetClass::Stock, &raw);
        assert!(matches!(late, Err(StbrError::EmptyData { .. })));
    }

    #[test]
    fn test_empty_raw_series() {
        let err = Normalizer::default()
            .normalize("X", AssetClass::Crypto, &RawSeries::new())
            .unwrap_err();
        assert!(matches!(err, StbrError::EmptyData { .. }));
    }
}
