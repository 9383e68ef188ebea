//! ScoredDay: one row of an entry or exit table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Score and triggered rule labels for a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDay {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Closing price rounded to 2 decimals.
    pub close: f64,
    /// Sum of rule points; integer or half-integer.
    pub score: f64,
    /// Labels of the rules that fired, in rule order.
    pub traits: Vec<String>,
}

impl ScoredDay {
    pub fn new(date: NaiveDate, close: f64, score: f64, traits: Vec<String>) -> Self {
        Self {
            date,
            close: round_cents(close),
            score,
            traits,
        }
    }
}

/// Round a price to 2 fractional digits.
pub fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
