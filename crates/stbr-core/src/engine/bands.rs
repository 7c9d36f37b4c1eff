//! Risk Bands
//!
//! Half-open STBR ratio intervals, their display colors, and the rotation
//! signal each one maps to.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StbrError};
use crate::model::Signal;

/// Band label used for cash holdings
pub const CASH_BAND: &str = "Cash";

/// Band label used for holdings that were not priced
pub const UNPRICED_BAND: &str = "N/A";

/// A named interval `[lower, upper)` over the STBR ratio domain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub color: String,
    pub signal: Signal,
}

impl RiskBand {
    pub fn new(
        label: impl Into<String>,
        lower: f64,
        upper: f64,
        color: impl Into<String>,
        signal: Signal,
    ) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
            color: color.into(),
            signal,
        }
    }

    pub fn contains(&self, ratio: f64) -> bool {
        self.lower <= ratio && ratio < self.upper
    }

    /// First word of the label, e.g. "Neutral"
    pub fn short_label(&self) -> &str {
        self.label.split_whitespace().next().unwrap_or(&self.label)
    }
}

/// Ordered set of bands partitioning the whole real line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskBandTable {
    bands: Vec<RiskBand>,
    #[serde(skip)]
    unknown: RiskBand,
}

impl Default for RiskBandTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskBandTable {
    /// Build a table, checking that the bands tile (-inf, +inf) in order.
    pub fn new(bands: Vec<RiskBand>) -> Result<Self> {
        let (first, last) = match (bands.first(), bands.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(StbrError::Config("risk band table is empty".into())),
        };

        if first.lower != f64::NEG_INFINITY {
            return Err(StbrError::Config(format!(
                "first band '{}' must start at -inf",
                first.label
            )));
        }
        if last.upper != f64::INFINITY {
            return Err(StbrError::Config(format!(
                "last band '{}' must end at +inf",
                last.label
            )));
        }

        for band in &bands {
            if band.lower.is_nan() || band.upper.is_nan() || band.lower >= band.upper {
                return Err(StbrError::Config(format!(
                    "band '{}' has an empty interval",
                    band.label
                )));
            }
        }

        for pair in bands.windows(2) {
            if pair[1].lower != pair[0].upper {
                return Err(StbrError::Config(format!(
                    "bands '{}' and '{}' are not contiguous",
                    pair[0].label, pair[1].label
                )));
            }
        }

        for (i, band) in bands.iter().enumerate() {
            let reserved = band.label == CASH_BAND || band.label == UNPRICED_BAND;
            if reserved || bands[..i].iter().any(|b| b.label == band.label) {
                return Err(StbrError::Config(format!(
                    "band label '{}' is reserved or duplicated",
                    band.label
                )));
            }
        }

        Ok(Self {
            bands,
            unknown: RiskBand::new("Unknown", f64::NAN, f64::NAN, "grey", Signal::Hold),
        })
    }

    /// The fixed 8-band STBR table
    pub fn standard() -> Self {
        let inf = f64::INFINITY;
        Self {
            bands: vec![
                RiskBand::new("Bearish < 0.5", -inf, 0.5, "#0000FF", Signal::RotateIn),
                RiskBand::new("Bearish 0.5-0.75", 0.5, 0.75, "#0055FF", Signal::RotateIn),
                RiskBand::new("Neutral 0.75-1", 0.75, 1.0, "#00FFFF", Signal::Hold),
                RiskBand::new("Normal 1-1.25", 1.0, 1.25, "#00FF00", Signal::Hold),
                // Kept at Hold even though it neighbours "Risky"
                RiskBand::new("Heating Up 1.25-1.50", 1.25, 1.50, "#FFFF00", Signal::Hold),
                RiskBand::new("Risky 1.50-1.75", 1.50, 1.75, "#FFA500", Signal::RotateOut),
                RiskBand::new("Super Risky 1.75-2", 1.75, 2.0, "#FF4500", Signal::RotateOut),
                RiskBand::new("Bubble Pop > 2", 2.0, inf, "#FF0000", Signal::RotateOut),
            ],
            unknown: RiskBand::new("Unknown", f64::NAN, f64::NAN, "grey", Signal::Hold),
        }
    }

    pub fn bands(&self) -> &[RiskBand] {
        &self.bands
    }

    /// First band containing `ratio`; the "Unknown" sentinel when none does
    /// (only reachable for NaN).
    pub fn classify(&self, ratio: f64) -> &RiskBand {
        self.bands
            .iter()
            .find(|band| band.contains(ratio))
            .unwrap_or(&self.unknown)
    }

    /// Rotation signal for a band label
    pub fn signal_for(&self, band_label: &str) -> Signal {
        if band_label == CASH_BAND {
            return Signal::Cash;
        }
        self.bands
            .iter()
            .find(|band| band.label == band_label)
            .map_or(Signal::Hold, |band| band.signal)
    }
}
