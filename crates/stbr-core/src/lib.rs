//! # stbr-core
//!
//! Short Term Bubble Risk (STBR): the ratio of an asset's latest close to
//! its trailing 140-day simple moving average, classified into risk bands
//! that drive a rotation signal.
//!
//! ## Bands
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  STBR ratio        Band                   Signal         │
//! ├──────────────────────────────────────────────────────────┤
//! │  < 0.5             Bearish < 0.5          Rotate In      │
//! │  0.5  - 0.75       Bearish 0.5-0.75       Rotate In      │
//! │  0.75 - 1.0        Neutral 0.75-1         Hold           │
//! │  1.0  - 1.25       Normal 1-1.25          Hold           │
//! │  1.25 - 1.50       Heating Up 1.25-1.50   Hold           │
//! │  1.50 - 1.75       Risky 1.50-1.75        Rotate Out     │
//! │  1.75 - 2.0        Super Risky 1.75-2     Rotate Out     │
//! │  >= 2.0            Bubble Pop > 2         Rotate Out     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Intervals are half-open: a ratio sitting exactly on a boundary belongs
//! to the band above it.
//!
//! ## Pipeline
//!
//! [`market::PriceSource`] fetches a provider-shaped daily series,
//! [`market::Normalizer`] turns it into a [`model::PriceSeries`],
//! [`engine::StbrEngine`] computes and classifies the ratio, and
//! [`StbrAnalyzer`] ties it together for charts and portfolios.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod model;
pub mod svckit;

pub use catalog::TickerCatalog;
pub use config::StbrConfig;
pub use engine::{RiskBand, RiskBandTable, StbrEngine};
pub use error::{FetchError, Result, StbrError};
pub use model::{
    AssetClass, HoldingFailure, HoldingInput, HoldingResult, HoldingValuation, PortfolioAnalysis,
    PriceSeries, Signal, StbrPoint,
};
pub use svckit::{ChartSeries, StbrAnalyzer};
