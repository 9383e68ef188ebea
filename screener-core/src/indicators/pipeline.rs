//! Indicator pipeline: bars in, indicator-complete bars out.
//!
//! Runs the short SMA, long SMA and relative-volume indicators over the whole
//! sequence once, then keeps only the positions where all three are defined.
//! Warmup bars fall off the front; a day whose relative volume is undefined
//! (zero trailing volume) is skipped individually.

use super::{Indicator, RelativeVolume, Sma};
use crate::domain::{Bar, IndicatorBar};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trailing window lengths for the three indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorWindows {
    /// Short SMA period (N).
    pub short: usize,
    /// Long SMA period (M).
    pub long: usize,
    /// Relative-volume period (K).
    pub rvol: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            short: 20,
            long: 50,
            rvol: 50,
        }
    }
}

impl IndicatorWindows {
    /// Bars required before the first day can carry every indicator.
    pub fn warmup(&self) -> usize {
        self.short.max(self.long).max(self.rvol)
    }
}

/// Attach trailing indicators to `bars`.
///
/// `bars` must be ascending by date. The output preserves that order and is
/// never longer than the input.
pub fn compute(bars: &[Bar], windows: &IndicatorWindows) -> Vec<IndicatorBar> {
    let sma_short = Sma::new(windows.short).compute(bars);
    let sma_long = Sma::new(windows.long).compute(bars);
    let rvol = RelativeVolume::new(windows.rvol).compute(bars);

    let warmup = windows.warmup().saturating_sub(1);
    let mut out = Vec::with_capacity(bars.len().saturating_sub(warmup));

    for (i, bar) in bars.iter().enumerate().skip(warmup) {
        let (s, l, r) = (sma_short[i], sma_long[i], rvol[i]);
        if !(s.is_finite() && l.is_finite() && r.is_finite()) {
            debug!(date = %bar.date, "skipping day with undefined indicator");
            continue;
        }
        out.push(IndicatorBar {
            bar: *bar,
            sma_short: s,
            sma_long: l,
            rvol: r,
        });
    }

    debug!(
        bars_in = bars.len(),
        bars_out = out.len(),
        warmup = windows.warmup(),
        "indicator pipeline complete"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, make_bars_with_volume, DEFAULT_EPSILON};

    fn windows(short: usize, long: usize, rvol: usize) -> IndicatorWindows {
        IndicatorWindows { short, long, rvol }
    }

    #[test]
    fn drops_warmup_from_the_front() {
        let closes: Vec<f64> = (1..=10).map(|c| c as f64).collect();
        let bars = make_bars(&closes);
        let out = compute(&bars, &windows(2, 4, 3));

        // max window 4 → first eligible index 3
        assert_eq!(out.len(), 7);
        assert_eq!(out[0].date(), bars[3].date);
        assert_eq!(out.last().unwrap().date(), bars[9].date);
    }

    #[test]
    fn values_come_from_trailing_windows() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let bars = make_bars_with_volume(&closes, &[100.0, 100.0, 100.0, 100.0, 300.0]);
        let out = compute(&bars, &windows(2, 5, 2));

        assert_eq!(out.len(), 1);
        let day = &out[0];
        assert_approx(day.sma_short, 13.5, DEFAULT_EPSILON);
        assert_approx(day.sma_long, 12.0, DEFAULT_EPSILON);
        // 300 / mean(100, 300)
        assert_approx(day.rvol, 1.5, DEFAULT_EPSILON);
    }

    #[test]
    fn shorter_than_window_yields_nothing() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        assert!(compute(&bars, &IndicatorWindows::default()).is_empty());
    }

    #[test]
    fn zero_volume_day_is_excluded() {
        let bars = make_bars_with_volume(&[10.0, 11.0, 12.0, 13.0], &[0.0, 0.0, 10.0, 10.0]);
        let out = compute(&bars, &windows(1, 1, 2));

        // index 1: mean(0,0) = 0 → undefined; index 0 has no rvol window
        let dates: Vec<_> = out.iter().map(|d| d.date()).collect();
        assert_eq!(dates, vec![bars[2].date, bars[3].date]);
    }

    #[test]
    fn default_windows() {
        let w = IndicatorWindows::default();
        assert_eq!((w.short, w.long, w.rvol), (20, 50, 50));
        assert_eq!(w.warmup(), 50);
    }
}
