//! Trailing-window indicators and the pipeline that attaches them to bars.
//!
//! Indicators are pure functions: bar history in, numeric series out. Each
//! series has the same length as the input, with `f64::NAN` wherever the value
//! is undefined (warmup, or a zero denominator). The pipeline drops every
//! position where any series is undefined, so NaN never reaches the scoring
//! rules.

pub mod pipeline;
pub mod rvol;
pub mod sma;

pub use pipeline::{compute, IndicatorWindows};
pub use rvol::RelativeVolume;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rvol_50").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    /// The first `lookback()` values are `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Mean of each trailing window of `period` values, aligned to the window's
/// last element. Positions before the first full window are NaN, as is any
/// window containing a NaN.
pub(crate) fn trailing_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }
    for (offset, window) in values.windows(period).enumerate() {
        result[offset + period - 1] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Same as [`make_bars`] with an explicit volume per bar.
#[cfg(test)]
pub fn make_bars_with_volume(closes: &[f64], volumes: &[f64]) -> Vec<Bar> {
    make_bars(closes)
        .into_iter()
        .zip(volumes)
        .map(|(bar, &volume)| Bar { volume, ..bar })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_mean_aligns_to_window_end() {
        let result = trailing_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(result[0].is_nan());
        assert_approx(result[1], 1.5, DEFAULT_EPSILON);
        assert_approx(result[2], 2.5, DEFAULT_EPSILON);
        assert_approx(result[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn trailing_mean_short_input_is_all_nan() {
        let result = trailing_mean(&[1.0, 2.0], 3);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
