//! Service Kit
//!
//! The operations the presentation layer calls: chart series, single
//! holding valuation and whole-portfolio analysis.

mod analyzer;
mod chart;
mod portfolio;

pub use analyzer::StbrAnalyzer;
pub use chart::{ChartPoint, ChartSeries, LatestReading, LegendEntry};
