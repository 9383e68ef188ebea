//! Entry and exit scoring rules.
//!
//! Rules are portfolio-agnostic and independent of each other: each one reads
//! the day's [`IndicatorBar`](crate::domain::IndicatorBar) (plus one other
//! specific value), awards its points, and optionally contributes a label.
//! The score is the plain sum of points; label order follows rule order.

pub mod entry;
pub mod exit;

pub use entry::{rvol_bonus, EntryRules, MAX_ENTRY_SCORE};
pub use exit::{ExitRules, MAX_EXIT_SCORE};

use serde::{Deserialize, Serialize};

/// Points and labels produced by one rule set for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleScore {
    pub score: f64,
    pub traits: Vec<String>,
}

impl RuleScore {
    /// Award `points` and record `label`.
    fn award(&mut self, points: f64, label: impl Into<String>) {
        self.score += points;
        self.traits.push(label.into());
    }
}
