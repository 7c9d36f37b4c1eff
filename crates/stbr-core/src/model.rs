//! Domain Models
//!
//! Price series, STBR readings and portfolio results.
//! Indicator math runs on `f64`; holding quantities and values use
//! `rust_decimal` - never use f64 for money!

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StbrError};

/// Asset class of a holding or chart request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
    Cash,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Stock => "stock",
            AssetClass::Crypto => "crypto",
            AssetClass::Cash => "cash",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = StbrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(AssetClass::Stock),
            "crypto" => Ok(AssetClass::Crypto),
            "cash" => Ok(AssetClass::Cash),
            other => Err(StbrError::InvalidInput(format!("Unknown asset type '{}'", other))),
        }
    }
}

/// Rotation signal derived from a risk band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "Rotate In")]
    RotateIn,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Rotate Out")]
    RotateOut,
    #[serde(rename = "Cash")]
    Cash,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Signal::RotateIn => "Rotate In",
            Signal::Hold => "Hold",
            Signal::RotateOut => "Rotate Out",
            Signal::Cash => "Cash",
        }
    }

    /// Display color used by the portfolio chart
    pub fn color(&self) -> &'static str {
        match self {
            Signal::RotateIn => "#00FF00",
            Signal::Hold => "#FFFF00",
            Signal::RotateOut => "#FF4500",
            Signal::Cash => "#AAAAAA",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One daily close
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Closing prices in strictly ascending date order.
///
/// Every close is finite and positive. The series cannot be modified once
/// built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(StbrError::DataFormat(format!(
                    "dates must be strictly increasing ({} follows {})",
                    pair[1].date, pair[0].date
                )));
            }
        }

        if let Some(bad) = points.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(StbrError::DataFormat(format!(
                "closing price on {} must be positive, got {}",
                bad.date, bad.close
            )));
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

/// STBR reading for a single date
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StbrPoint {
    pub date: NaiveDate,
    pub close: f64,
    /// Trailing simple moving average ending on `date`
    pub sma: f64,
    /// close / sma
    pub ratio: f64,
}

/// Quantity as submitted by a client: a JSON number or numeric text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
}

impl Default for QuantityInput {
    fn default() -> Self {
        QuantityInput::Number(0.0)
    }
}

impl QuantityInput {
    /// Parse into a non-negative decimal, `None` if not a valid amount.
    pub fn parse(&self) -> Option<Decimal> {
        use rust_decimal::prelude::FromPrimitive;

        let value = match self {
            // Values outside the Decimal range (about 7.9e28) are invalid
            QuantityInput::Number(n) => Decimal::from_f64(*n)?,
            QuantityInput::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()?
            }
        };

        (value >= Decimal::ZERO).then_some(value)
    }
}

impl fmt::Display for QuantityInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityInput::Number(n) => write!(f, "{}", n),
            QuantityInput::Text(s) => f.write_str(s),
        }
    }
}

impl From<Decimal> for QuantityInput {
    fn from(value: Decimal) -> Self {
        QuantityInput::Text(value.to_string())
    }
}

/// A portfolio line item as submitted, before validation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HoldingInput {
    #[serde(default)]
    pub ticker: String,

    /// Defaults to crypto when absent
    #[serde(default, alias = "asset_class")]
    pub asset_type: Option<String>,

    /// Units held, or the dollar amount for cash
    #[serde(default, alias = "quantity")]
    pub shares: QuantityInput,
}

impl HoldingInput {
    pub fn new(
        ticker: impl Into<String>,
        asset_class: AssetClass,
        shares: impl Into<QuantityInput>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            asset_type: Some(asset_class.as_str().into()),
            shares: shares.into(),
        }
    }

    /// Validate into a [`Holding`]
    pub fn resolve(&self) -> Result<Holding> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(StbrError::InvalidInput("Missing ticker symbol".into()));
        }

        let quantity = self
            .shares
            .parse()
            .ok_or_else(|| StbrError::InvalidInput("Invalid shares/amount value".into()))?;

        let asset_class = match self.asset_type.as_deref() {
            None | Some("") => AssetClass::Crypto,
            Some(raw) => raw
                .parse()
                .map_err(|_| StbrError::InvalidInput("Invalid asset type".into()))?,
        };

        Ok(Holding { ticker, asset_class, quantity })
    }
}

impl From<f64> for QuantityInput {
    fn from(value: f64) -> Self {
        QuantityInput::Number(value)
    }
}

impl From<&str> for QuantityInput {
    fn from(value: &str) -> Self {
        QuantityInput::Text(value.to_string())
    }
}

/// A validated holding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub quantity: Decimal,
}

/// A successfully valued holding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub quantity: Decimal,
    pub latest_close: Decimal,
    pub value: Decimal,
    /// `None` for cash and zero-quantity holdings
    pub latest_stbr: Option<f64>,
    pub as_of: Option<NaiveDate>,
    pub band: String,
    pub band_color: String,
    pub signal: Signal,
}

/// A holding that could not be valued
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldingFailure {
    pub ticker: String,
    pub asset_type: Option<String>,
    pub shares: Option<String>,
    pub error: String,
    /// Rate limits, timeouts and transport failures may succeed on retry
    pub retryable: bool,
}

impl HoldingFailure {
    pub fn new(input: &HoldingInput, error: &StbrError) -> Self {
        let ticker = input.ticker.trim().to_uppercase();
        Self {
            ticker: if ticker.is_empty() { "N/A".into() } else { ticker },
            asset_type: input.asset_type.clone(),
            shares: Some(input.shares.to_string()),
            error: match error {
                StbrError::InvalidInput(msg) => msg.clone(),
                other => other.to_string(),
            },
            retryable: error.is_retryable(),
        }
    }

    /// A valued holding too large to add to the portfolio totals
    pub fn total_overflow(valuation: &HoldingValuation) -> Self {
        Self {
            ticker: valuation.ticker.clone(),
            asset_type: Some(valuation.asset_class.as_str().into()),
            shares: Some(valuation.quantity.to_string()),
            error: "Holding value exceeds the portfolio total range".into(),
            retryable: false,
        }
    }
}

/// Per-holding outcome, in input order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoldingResult {
    Valued(HoldingValuation),
    Failed(HoldingFailure),
}

impl HoldingResult {
    pub fn valuation(&self) -> Option<&HoldingValuation> {
        match self {
            HoldingResult::Valued(v) => Some(v),
            HoldingResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&HoldingFailure> {
        match self {
            HoldingResult::Valued(_) => None,
            HoldingResult::Failed(f) => Some(f),
        }
    }
}

impl From<std::result::Result<HoldingValuation, HoldingFailure>> for HoldingResult {
    fn from(result: std::result::Result<HoldingValuation, HoldingFailure>) -> Self {
        match result {
            Ok(v) => HoldingResult::Valued(v),
            Err(f) => HoldingResult::Failed(f),
        }
    }
}

/// One bar of the holdings-by-signal chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub ticker: String,
    pub asset_class: AssetClass,
    pub value: Decimal,
    /// Share of total portfolio value
    pub percent: Decimal,
    pub signal: Signal,
    pub color: String,
}

/// Result of analyzing a whole portfolio
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub id: Uuid,
    pub holdings: Vec<HoldingResult>,
    /// Sum over every valued holding, cash included
    pub total_value: Decimal,
    /// Sum over holdings signalling Rotate Out
    pub rotate_out_value: Decimal,
    pub analyzed_at: DateTime<Utc>,
}

impl PortfolioAnalysis {
    pub fn new(holdings: Vec<HoldingResult>) -> Self {
        let mut total_value = Decimal::ZERO;
        let mut rotate_out_value = Decimal::ZERO;

        // A holding that would overflow either total is reported as failed
        let holdings = holdings
            .into_iter()
            .map(|result| {
                let HoldingResult::Valued(valuation) = result else {
                    return result;
                };

                let total = total_value.checked_add(valuation.value);
                let rotate_out = if valuation.signal == Signal::RotateOut {
                    rotate_out_value.checked_add(valuation.value)
                } else {
                    Some(rotate_out_value)
                };

                match (total, rotate_out) {
                    (Some(total), Some(rotate_out)) => {
                        total_value = total;
                        rotate_out_value = rotate_out;
                        HoldingResult::Valued(valuation)
                    }
                    _ => HoldingResult::Failed(HoldingFailure::total_overflow(&valuation)),
                }
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            holdings,
            total_value,
            rotate_out_value,
            analyzed_at: Utc::now(),
        }
    }

    pub fn valuations(&self) -> impl Iterator<Item = &HoldingValuation> {
        self.holdings.iter().filter_map(HoldingResult::valuation)
    }

    pub fn failures(&self) -> impl Iterator<Item = &HoldingFailure> {
        self.holdings.iter().filter_map(HoldingResult::failure)
    }

    /// Percentage of the portfolio flagged Rotate Out
    pub fn rotate_out_percent(&self) -> Decimal {
        if self.total_value == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.rotate_out_value / self.total_value) * Decimal::from(100)
    }

    /// Valued holdings worth more than zero, largest first
    pub fn allocations(&self) -> Vec<AllocationRow> {
        let mut rows: Vec<AllocationRow> = self
            .valuations()
            .filter(|v| v.value > Decimal::ZERO)
            .map(|v| AllocationRow {
                ticker: v.ticker.clone(),
                asset_class: v.asset_class,
                value: v.value,
                percent: (v.value / self.total_value) * Decimal::from(100),
                signal: v.signal,
                color: v.signal.color().to_string(),
            })
            .collect();

        rows.sort_by(|a, b| b.value.cmp(&a.value));
        rows
    }

    /// Generate summary
    pub fn summary(&self) -> String {
        format!(
            "{} holdings ({} failed), total ${:.2}, rotate out ${:.2} ({:.1}%)",
            self.holdings.len(),
            self.failures().count(),
            self.total_value,
            self.rotate_out_value,
            self.rotate_out_percent()
        )
    }
}
