//! Portfolio Aggregator
//!
//! Values each holding at its latest close, attaches the STBR band and
//! rotation signal, and totals the portfolio. Holdings are independent: one
//! failure never stops the batch.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::StbrAnalyzer;
use crate::engine::{CASH_BAND, UNPRICED_BAND};
use crate::error::{Result, StbrError};
use crate::model::{
    AssetClass, Holding, HoldingFailure, HoldingInput, HoldingResult, HoldingValuation,
    PortfolioAnalysis,
};

const UNPRICED_COLOR: &str = "grey";

impl StbrAnalyzer {
    /// Value a single holding.
    pub async fn analyze_holding(
        &self,
        input: &HoldingInput,
    ) -> std::result::Result<HoldingValuation, HoldingFailure> {
        let outcome = match input.resolve() {
            Ok(holding) => self.value_holding(&holding).await,
            Err(e) => Err(e),
        };

        outcome.map_err(|e| {
            tracing::warn!(ticker = %input.ticker, "Holding not valued: {}", e);
            HoldingFailure::new(input, &e)
        })
    }

    /// Value every holding in input order and total the results.
    #[tracing::instrument(skip_all, fields(holdings = inputs.len()))]
    pub async fn analyze_portfolio(&self, inputs: &[HoldingInput]) -> PortfolioAnalysis {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            results.push(HoldingResult::from(self.analyze_holding(input).await));
        }

        let analysis = PortfolioAnalysis::new(results);
        tracing::info!(id = %analysis.id, "Portfolio analysis complete: {}", analysis.summary());
        analysis
    }

    async fn value_holding(&self, holding: &Holding) -> Result<HoldingValuation> {
        if holding.asset_class == AssetClass::Cash {
            return Ok(HoldingValuation {
                ticker: holding.ticker.clone(),
                asset_class: AssetClass::Cash,
                quantity: holding.quantity,
                latest_close: dec!(1.00),
                value: holding.quantity,
                latest_stbr: None,
                as_of: None,
                band: CASH_BAND.into(),
                band_color: self.engine.signal_for(CASH_BAND).color().into(),
                signal: self.engine.signal_for(CASH_BAND),
            });
        }

        if holding.quantity.is_zero() {
            return Ok(HoldingValuation {
                ticker: holding.ticker.clone(),
                asset_class: holding.asset_class,
                quantity: Decimal::ZERO,
                latest_close: Decimal::ZERO,
                value: Decimal::ZERO,
                latest_stbr: None,
                as_of: None,
                band: UNPRICED_BAND.into(),
                band_color: UNPRICED_COLOR.into(),
                signal: self.engine.signal_for(UNPRICED_BAND),
            });
        }

        let series = self
            .price_series(&holding.ticker, holding.asset_class)
            .await?;
        let assessment = self.engine.assess_latest(&series)?;
        let point = assessment.point;

        let latest_close = Decimal::from_f64(point.close).ok_or_else(|| {
            StbrError::DataFormat(format!("close {} cannot be represented", point.close))
        })?;
        let value = latest_close
            .checked_mul(holding.quantity)
            .ok_or_else(|| StbrError::InvalidInput("Invalid shares/amount value".into()))?;

        tracing::debug!(
            ticker = %holding.ticker,
            ratio = point.ratio,
            band = %assessment.band.label,
            signal = %assessment.signal,
            "Valued holding"
        );

        Ok(HoldingValuation {
            ticker: holding.ticker.clone(),
            asset_class: holding.asset_class,
            quantity: holding.quantity,
            latest_close,
            value,
            latest_stbr: Some(point.ratio),
            as_of: Some(point.date),
            band: assessment.band.label,
            band_color: assessment.band.color,
            signal: assessment.signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MockFailure, MockPriceSource, RawRecord, RawSeries};
    use crate::model::Signal;
    use chrono::{Days, NaiveDate};
    use std::sync::Arc;

    /// 139 days at 100 followed by `last`
    fn raw_ending_at(last: f64) -> RawSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..140u64)
            .map(|i| {
                let close = if i == 139 { last } else { 100.0 };
                let mut record = RawRecord::new();
                record.insert("4. close".into(), close.to_string().into());
                record.insert("5. adjusted close".into(), close.to_string().into());
                ((start + Days::new(i)).to_string(), record)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cash_only_portfolio() {
        let source = Arc::new(MockPriceSource::new());
        let analyzer = StbrAnalyzer::with_source(source.clone());

        let analysis = analyzer
            .analyze_portfolio(&[HoldingInput::new("CASH", AssetClass::Cash, 1000.0)])
            .await;

        assert_eq!(analysis.total_value, dec!(1000));
        assert_eq!(analysis.rotate_out_value, Decimal::ZERO);
        let cash = analysis.holdings[0].valuation().unwrap();
        assert_eq!(cash.signal, Signal::Cash);
        assert_eq!(cash.band, "Cash");
        assert_eq!(cash.latest_close, dec!(1.00));
        assert!(cash.latest_stbr.is_none());
        assert!(source.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_is_not_fetched() {
        let source = Arc::new(MockPriceSource::new());
        let analyzer = StbrAnalyzer::with_source(source.clone());

        let analysis = analyzer
            .analyze_portfolio(&[
                HoldingInput::new("AAPL", AssetClass::Stock, "0"),
                HoldingInput::new("BTC", AssetClass::Crypto, 1.0),
            ])
            .await;

        let zero = analysis.holdings[0].valuation().unwrap();
        assert_eq!(zero.value, Decimal::ZERO);
        assert_eq!(zero.band, "N/A");
        assert_eq!(zero.signal, Signal::Hold);
        assert_eq!(source.calls().await, vec!["BTC".to_string()]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let source = MockPriceSource::new()
            .with_series("AAPL", raw_ending_at(100.0))
            .with_series("BTC", raw_ending_at(180.0))
            .with_failure("FAIL", MockFailure::Provider("Invalid API call".into()));
        let analyzer = StbrAnalyzer::with_source(Arc::new(source));

        let analysis = analyzer
            .analyze_portfolio(&[
                HoldingInput::new("AAPL", AssetClass::Stock, "2"),
                HoldingInput::new("FAIL", AssetClass::Stock, "3"),
                HoldingInput::new("BTC", AssetClass::Crypto, "1"),
            ])
            .await;

        assert_eq!(analysis.holdings.len(), 3);

        let aapl = analysis.holdings[0].valuation().unwrap();
        assert_eq!(aapl.value, dec!(200));
        assert_eq!(aapl.signal, Signal::Hold);

        let failed = analysis.holdings[1].failure().unwrap();
        assert_eq!(failed.ticker, "FAIL");
        assert!(failed.error.contains("Invalid API call"));
        assert!(!failed.retryable);

        let btc = analysis.holdings[2].valuation().unwrap();
        assert_eq!(btc.signal, Signal::RotateOut);
        assert_eq!(btc.value, dec!(180));

        assert_eq!(analysis.total_value, dec!(380));
        assert_eq!(analysis.rotate_out_value, dec!(180));
    }

    #[tokio::test]
    async fn test_input_errors() {
        let analyzer = StbrAnalyzer::with_source(Arc::new(MockPriceSource::new()));

        let missing = analyzer
            .analyze_holding(&HoldingInput::new("  ", AssetClass::Stock, "1"))
            .await
            .unwrap_err();
        assert_eq!(missing.ticker, "N/A");
        assert_eq!(missing.error, "Missing ticker symbol");

        let negative = analyzer
            .analyze_holding(&HoldingInput::new("AAPL", AssetClass::Stock, "-5"))
            .await
            .unwrap_err();
        assert_eq!(negative.error, "Invalid shares/amount value");

        let garbage = analyzer
            .analyze_holding(&HoldingInput::new("AAPL", AssetClass::Stock, "lots"))
            .await
            .unwrap_err();
        assert_eq!(garbage.shares.as_deref(), Some("lots"));
    }

    #[tokio::test]
    async fn test_insufficient_history_is_per_holding() {
        let mut short = RawSeries::new();
        let mut record = RawRecord::new();
        record.insert("4. close".into(), "10".into());
        short.insert("2024-05-01".into(), record);

        let source = MockPriceSource::new().with_series("NEW", short);
        let analyzer = StbrAnalyzer::with_source(Arc::new(source));

        let analysis = analyzer
            .analyze_portfolio(&[
                HoldingInput::new("NEW", AssetClass::Crypto, "5"),
                HoldingInput::new("CASH", AssetClass::Cash, "250.50"),
            ])
            .await;

        let failed = analysis.holdings[0].failure().unwrap();
        assert!(failed.error.contains("Insufficient history"));
        assert_eq!(analysis.total_value, dec!(250.50));
    }

    #[tokio::test]
    async fn test_value_overflow_is_a_holding_failure() {
        let analyzer = StbrAnalyzer::with_source(Arc::new(MockPriceSource::new()));

        let failure = analyzer
            .analyze_holding(&HoldingInput::new("AAPL", AssetClass::Stock, "1e28"))
            .await
            .unwrap_err();
        assert_eq!(failure.error, "Invalid shares/amount value");
        assert!(!failure.retryable);
    }

    #[tokio::test]
    async fn test_total_overflow_keeps_batch_going() {
        let analyzer = StbrAnalyzer::with_source(Arc::new(MockPriceSource::new()));
        let huge = "50000000000000000000000000000";

        let analysis = analyzer
            .analyze_portfolio(&[
                HoldingInput::new("CASH", AssetClass::Cash, huge),
                HoldingInput::new("CASH", AssetClass::Cash, huge),
                HoldingInput::new("CASH", AssetClass::Cash, "10"),
            ])
            .await;

        assert_eq!(analysis.holdings.len(), 3);
        assert!(analysis.holdings[0].valuation().is_some());
        let failed = analysis.holdings[1].failure().unwrap();
        assert_eq!(failed.ticker, "CASH");
        assert!(analysis.holdings[2].valuation().is_some());
        assert_eq!(
            analysis.total_value,
            Decimal::from_str_exact("50000000000000000000000000010").unwrap()
        );
    }

    #[tokio::test]
    async fn test_rate_limit_marked_retryable() {
        let source = MockPriceSource::new().with_failure("ETH", MockFailure::RateLimited);
        let analyzer = StbrAnalyzer::with_source(Arc::new(source));

        let failure = analyzer
            .analyze_holding(&HoldingInput::new("ETH", AssetClass::Crypto, "1"))
            .await
            .unwrap_err();
        assert!(failure.retryable);
    }
}
