//! Entry rules: candidate days for opening a position.
//!
//! | rule                  | condition                                   | points |
//! |-----------------------|---------------------------------------------|--------|
//! | Bullish candle        | close > open                                | 1      |
//! | Above short SMA       | close > sma_short                           | 1      |
//! | Above long SMA        | close > sma_long                            | 1      |
//! | Bullish continuation  | high > prev.high and low > prev.low         | 1      |
//! | Relative volume       | step function of rvol (see [`rvol_bonus`])  | 0–5    |

use super::RuleScore;
use crate::domain::IndicatorBar;
use crate::indicators::IndicatorWindows;

/// Highest attainable entry score: four unit rules plus the top RVOL step.
pub const MAX_ENTRY_SCORE: f64 = 9.0;

/// RVOL thresholds (strictly greater than) and their bonus, highest first.
const RVOL_STEPS: [(f64, f64); 5] = [(5.0, 5.0), (3.0, 3.0), (2.0, 2.0), (1.5, 1.5), (1.0, 1.0)];

/// Bonus points for a relative-volume reading. Zero at or below 1.0.
pub fn rvol_bonus(rvol: f64) -> f64 {
    RVOL_STEPS
        .iter()
        .find(|(threshold, _)| rvol > *threshold)
        .map_or(0.0, |&(_, bonus)| bonus)
}

/// Entry rule set, labelled with the configured SMA periods.
#[derive(Debug, Clone)]
pub struct EntryRules {
    short_period: usize,
    long_period: usize,
}

impl EntryRules {
    pub fn new(windows: &IndicatorWindows) -> Self {
        Self {
            short_period: windows.short,
            long_period: windows.long,
        }
    }

    /// Score `day` against its predecessor `prev`.
    pub fn evaluate(&self, day: &IndicatorBar, prev: &IndicatorBar) -> RuleScore {
        let bar = &day.bar;
        let mut out = RuleScore::default();

        if bar.is_bullish() {
            out.award(1.0, "Bullish candle");
        }
        if bar.close > day.sma_short {
            out.award(1.0, format!("Above {}-period SMA", self.short_period));
        }
        if bar.close > day.sma_long {
            out.award(1.0, format!("Above {}-period SMA", self.long_period));
        }
        if bar.high > prev.bar.high && bar.low > prev.bar.low {
            out.award(1.0, "Bullish continuation");
        }

        let bonus = rvol_bonus(day.rvol);
        if bonus > 0.0 {
            out.award(bonus, format!("RVOL: {:.2}", day.rvol));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn day(open: f64, high: f64, low: f64, close: f64, sma: (f64, f64), rvol: f64) -> IndicatorBar {
        IndicatorBar {
            bar: Bar {
                date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            },
            sma_short: sma.0,
            sma_long: sma.1,
            rvol,
        }
    }

    fn rules() -> EntryRules {
        EntryRules::new(&IndicatorWindows::default())
    }

    #[test]
    fn rvol_step_function() {
        assert_eq!(rvol_bonus(0.5), 0.0);
        assert_eq!(rvol_bonus(1.0), 0.0);
        assert_eq!(rvol_bonus(1.01), 1.0);
        assert_eq!(rvol_bonus(1.5), 1.0);
        assert_eq!(rvol_bonus(1.51), 1.5);
        assert_eq!(rvol_bonus(2.0), 1.5);
        assert_eq!(rvol_bonus(2.5), 2.0);
        assert_eq!(rvol_bonus(3.0), 2.0);
        assert_eq!(rvol_bonus(4.0), 3.0);
        assert_eq!(rvol_bonus(5.0), 3.0);
        assert_eq!(rvol_bonus(5.01), 5.0);
    }

    #[test]
    fn every_rule_fires() {
        let prev = day(10.0, 11.0, 9.0, 10.0, (10.0, 10.0), 1.0);
        let today = day(10.0, 12.0, 9.5, 11.5, (10.5, 10.2), 6.0);
        let score = rules().evaluate(&today, &prev);

        assert_eq!(score.score, MAX_ENTRY_SCORE);
        assert_eq!(
            score.traits,
            vec![
                "Bullish candle",
                "Above 20-period SMA",
                "Above 50-period SMA",
                "Bullish continuation",
                "RVOL: 6.00",
            ]
        );
    }

    #[test]
    fn nothing_fires() {
        let prev = day(10.0, 11.0, 9.0, 10.0, (10.0, 10.0), 1.0);
        let today = day(10.0, 10.5, 8.5, 9.0, (9.5, 9.8), 0.8);
        let score = rules().evaluate(&today, &prev);

        assert_eq!(score.score, 0.0);
        assert!(score.traits.is_empty());
    }

    #[test]
    fn half_point_rvol_label() {
        let prev = day(10.0, 11.0, 9.0, 10.0, (10.0, 10.0), 1.0);
        let today = day(10.0, 10.5, 8.5, 9.0, (9.5, 9.8), 1.6);
        let score = rules().evaluate(&today, &prev);

        assert_eq!(score.score, 1.5);
        assert_eq!(score.traits, vec!["RVOL: 1.60"]);
    }

    #[test]
    fn continuation_needs_both_higher_high_and_higher_low() {
        let prev = day(10.0, 11.0, 9.0, 10.0, (20.0, 20.0), 1.0);
        let higher_high_only = day(10.0, 11.5, 8.9, 10.0, (20.0, 20.0), 1.0);
        assert_eq!(rules().evaluate(&higher_high_only, &prev).score, 0.0);

        let equal_high = day(10.0, 11.0, 9.5, 10.0, (20.0, 20.0), 1.0);
        assert_eq!(rules().evaluate(&equal_high, &prev).score, 0.0);
    }

    #[test]
    fn labels_use_configured_periods() {
        let rules = EntryRules::new(&IndicatorWindows {
            short: 10,
            long: 30,
            rvol: 20,
        });
        let prev = day(10.0, 11.0, 9.0, 10.0, (10.0, 10.0), 1.0);
        let today = day(10.0, 10.5, 8.5, 10.0, (9.0, 9.0), 1.0);
        let score = rules.evaluate(&today, &prev);
        assert_eq!(score.traits, vec!["Above 10-period SMA", "Above 30-period SMA"]);
    }
}
