//! IndicatorBar: a bar with its trailing indicators attached.

use super::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A [`Bar`] augmented with the derived indicators the signal rules read.
///
/// Every field is defined: the pipeline never emits a row with a missing or
/// non-finite indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBar {
    pub bar: Bar,
    /// Mean close over the short trailing window (inclusive of this bar).
    pub sma_short: f64,
    /// Mean close over the long trailing window (inclusive of this bar).
    pub sma_long: f64,
    /// Volume over the mean volume of the trailing relative-volume window.
    pub rvol: f64,
}

impl IndicatorBar {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}
