//! STBR Engine
//!
//! Rolling ratio computation plus risk-band classification.

mod bands;
mod stbr;

pub use bands::{RiskBand, RiskBandTable, CASH_BAND, UNPRICED_BAND};
pub use stbr::{compute_stbr, latest_stbr, STBR_WINDOW};

use serde::Serialize;

use crate::error::Result;
use crate::model::{PriceSeries, Signal, StbrPoint};

/// A ratio together with its band and signal
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assessment {
    pub point: StbrPoint,
    pub band: RiskBand,
    pub signal: Signal,
}

/// Computes and classifies STBR readings against an injected band table.
#[derive(Clone, Debug, Default)]
pub struct StbrEngine {
    bands: RiskBandTable,
}

impl StbrEngine {
    pub fn new(bands: RiskBandTable) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &RiskBandTable {
        &self.bands
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<Vec<StbrPoint>> {
        compute_stbr(series, STBR_WINDOW)
    }

    pub fn classify(&self, ratio: f64) -> &RiskBand {
        self.bands.classify(ratio)
    }

    pub fn signal_for(&self, band_label: &str) -> Signal {
        self.bands.signal_for(band_label)
    }

    pub fn assess(&self, point: StbrPoint) -> Assessment {
        let band = self.classify(point.ratio).clone();
        let signal = self.signal_for(&band.label);
        Assessment { point, band, signal }
    }

    /// Classify the most recent reading of a series
    pub fn assess_latest(&self, series: &PriceSeries) -> Result<Assessment> {
        let point = latest_stbr(series, STBR_WINDOW)?;
        Ok(self.assess(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::{Days, NaiveDate};

    #[test]
    fn test_assess_latest_on_rally() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        // Flat at 100 then a jump to 180 on the final day
        let points = (0..140u64)
            .map(|i| PricePoint::new(start + Days::new(i), if i == 139 { 180.0 } else { 100.0 }))
            .collect();
        let series = PriceSeries::new(points).unwrap();

        let assessment = StbrEngine::default().assess_latest(&series).unwrap();
        // 180 / ((139 * 100 + 180) / 140) ~= 1.79
        assert_eq!(assessment.band.label, "Super Risky 1.75-2");
        assert_eq!(assessment.signal, Signal::RotateOut);
    }
}
