//! Chart Series
//!
//! Price and STBR time series annotated with band colors, ready for the
//! presentation layer to plot.

use chrono::NaiveDate;
use serde::Serialize;

use super::StbrAnalyzer;
use crate::error::{Result, StbrError};
use crate::model::{AssetClass, Signal};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma: f64,
    pub ratio: f64,
    pub band: String,
    pub color: String,
}

/// Headline reading for the most recent date
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LatestReading {
    pub date: NaiveDate,
    pub close: f64,
    pub ratio: f64,
    pub band: String,
    pub short_label: String,
    pub color: String,
    pub signal: Signal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub points: Vec<ChartPoint>,
    pub latest: LatestReading,
    pub legend: Vec<LegendEntry>,
}

impl StbrAnalyzer {
    /// STBR history for one symbol. Errors are surfaced, not recovered.
    #[tracing::instrument(skip(self))]
    pub async fn chart_series(&self, symbol: &str, asset_class: AssetClass) -> Result<ChartSeries> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(StbrError::InvalidInput("Missing ticker symbol".into()));
        }
        if asset_class == AssetClass::Cash {
            return Err(StbrError::InvalidInput(
                "Cannot analyze CASH directly. Add it to your portfolio instead.".into(),
            ));
        }

        let series = self.price_series(&symbol, asset_class).await?;
        let stbr = self.engine.compute(&series)?;

        let points: Vec<ChartPoint> = stbr
            .iter()
            .map(|p| {
                let band = self.engine.classify(p.ratio);
                ChartPoint {
                    date: p.date,
                    close: p.close,
                    sma: p.sma,
                    ratio: p.ratio,
                    band: band.label.clone(),
                    color: band.color.clone(),
                }
            })
            .collect();

        // compute() never returns an empty sequence
        let last = *stbr.last().ok_or(StbrError::InsufficientHistory {
            needed: crate::engine::STBR_WINDOW,
            available: series.len(),
        })?;
        let assessment = self.engine.assess(last);
        let latest = LatestReading {
            date: last.date,
            close: last.close,
            ratio: last.ratio,
            band: assessment.band.label.clone(),
            short_label: assessment.band.short_label().to_string(),
            color: assessment.band.color.clone(),
            signal: assessment.signal,
        };

        let legend = self
            .engine
            .bands()
            .bands()
            .iter()
            .map(|b| LegendEntry {
                label: b.label.clone(),
                color: b.color.clone(),
            })
            .collect();

        tracing::info!(
            symbol = %symbol,
            points = points.len(),
            ratio = latest.ratio,
            band = %latest.short_label,
            "STBR chart series ready"
        );

        Ok(ChartSeries {
            symbol,
            asset_class,
            points,
            latest,
            legend,
        })
    }
}
