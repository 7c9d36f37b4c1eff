//! Short Term Bubble Risk calculation.
//!
//! STBR is the ratio of a close to the simple moving average of the
//! trailing `window` closes ending on the same day.

use crate::error::{Result, StbrError};
use crate::model::{PriceSeries, StbrPoint};

/// Trailing window, in daily samples (~20 weeks)
pub const STBR_WINDOW: usize = 140;

/// Compute the STBR for every date with a full trailing window.
///
/// The first `window - 1` dates are dropped. A series shorter than the
/// window yields [`StbrError::InsufficientHistory`].
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use stbr_core::engine::compute_stbr;
/// use stbr_core::model::{PricePoint, PriceSeries};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let points = (0..4)
///     .map(|i| PricePoint::new(start + chrono::Days::new(i), 10.0 + i as f64))
///     .collect();
/// let series = PriceSeries::new(points).unwrap();
///
/// let stbr = compute_stbr(&series, 3).unwrap();
/// assert_eq!(stbr.len(), 2);
/// // 12 / mean(10, 11, 12)
/// assert!((stbr[0].ratio - 12.0 / 11.0).abs() < 1e-12);
/// ```
pub fn compute_stbr(series: &PriceSeries, window: usize) -> Result<Vec<StbrPoint>> {
    if window == 0 {
        return Err(StbrError::InvalidInput("STBR window must be positive".into()));
    }

    let points = series.points();
    if points.len() < window {
        return Err(StbrError::InsufficientHistory {
            needed: window,
            available: points.len(),
        });
    }

    let period = window as f64;
    let mut result = Vec::with_capacity(points.len() + 1 - window);

    // Rolling sum over the trailing window
    let mut sum: f64 = points[..window].iter().map(|p| p.close).sum();
    for i in (window - 1)..points.len() {
        if i >= window {
            sum += points[i].close - points[i - window].close;
        }
        let sma = sum / period;
        result.push(StbrPoint {
            date: points[i].date,
            close: points[i].close,
            sma,
            ratio: points[i].close / sma,
        });
    }

    Ok(result)
}

/// STBR for the most recent date only.
pub fn latest_stbr(series: &PriceSeries, window: usize) -> Result<StbrPoint> {
    if window == 0 {
        return Err(StbrError::InvalidInput("STBR window must be positive".into()));
    }

    let points = series.points();
    let (tail, last) = match points.len().checked_sub(window) {
        Some(start) => (&points[start..], &points[points.len() - 1]),
        None => {
            return Err(StbrError::InsufficientHistory {
                needed: window,
                available: points.len(),
            })
        }
    };

    let sma = tail.iter().map(|p| p.close).sum::<f64>() / window as f64;
    Ok(StbrPoint {
        date: last.date,
        close: last.close,
        sma,
        ratio: last.close / sma,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use chrono::{Days, NaiveDate};

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(start + Days::new(i as u64), c))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 25.0 * (i as f64 / 17.0).sin() + i as f64 * 0.3)
            .collect()
    }

    #[test]
    fn test_exact_window_yields_one_point() {
        let stbr = compute_stbr(&series_from(&wavy(140)), STBR_WINDOW).unwrap();
        assert_eq!(stbr.len(), 1);
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let err = compute_stbr(&series_from(&wavy(139)), STBR_WINDOW).unwrap_err();
        assert!(matches!(
            err,
            StbrError::InsufficientHistory { needed: 140, available: 139 }
        ));
    }

    #[test]
    fn test_point_count() {
        let stbr = compute_stbr(&series_from(&wavy(280)), STBR_WINDOW).unwrap();
        assert_eq!(stbr.len(), 141);
    }

    #[test]
    fn test_ratio_matches_trailing_mean() {
        let closes = wavy(400);
        let series = series_from(&closes);
        let stbr = compute_stbr(&series, STBR_WINDOW).unwrap();

        for (k, point) in stbr.iter().enumerate() {
            let i = k + STBR_WINDOW - 1;
            let mean = closes[i + 1 - STBR_WINDOW..=i].iter().sum::<f64>() / 140.0;
            assert_eq!(point.date, series.points()[i].date);
            assert!((point.sma - mean).abs() < 1e-9);
            assert!((point.ratio - closes[i] / mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_series_has_unit_ratio() {
        let stbr = compute_stbr(&series_from(&[42.0; 150]), STBR_WINDOW).unwrap();
        assert!(stbr.iter().all(|p| (p.ratio - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_latest_matches_full_computation() {
        let series = series_from(&wavy(300));
        let all = compute_stbr(&series, STBR_WINDOW).unwrap();
        let latest = latest_stbr(&series, STBR_WINDOW).unwrap();
        let last = all.last().unwrap();
        assert_eq!(latest.date, last.date);
        assert!((latest.ratio - last.ratio).abs() < 1e-9);

        assert!(latest_stbr(&series_from(&wavy(10)), STBR_WINDOW).is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let series = series_from(&wavy(5));
        assert!(matches!(compute_stbr(&series, 0), Err(StbrError::InvalidInput(_))));
        assert!(matches!(latest_stbr(&series, 0), Err(StbrError::InvalidInput(_))));
    }
}
