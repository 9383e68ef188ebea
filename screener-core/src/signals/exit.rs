//! Exit rules: candidate days for closing a position.
//!
//! Every day in an exit window is compared with the same reference price: the
//! close of the bar immediately before the window.

use super::RuleScore;
use crate::domain::IndicatorBar;
use crate::indicators::IndicatorWindows;

/// Highest attainable exit score.
pub const MAX_EXIT_SCORE: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct ExitRules {
    short_period: usize,
}

impl ExitRules {
    pub fn new(windows: &IndicatorWindows) -> Self {
        Self {
            short_period: windows.short,
        }
    }

    /// Score `day` against the fixed `reference_price` of the window.
    pub fn evaluate(&self, day: &IndicatorBar, reference_price: f64) -> RuleScore {
        let close = day.close();
        let mut out = RuleScore::default();

        if close < day.sma_short {
            out.award(1.0, format!("Below {}-period SMA", self.short_period));
        }
        if close < reference_price {
            out.award(1.0, "Below reference price");
        }

        out
    }
}
