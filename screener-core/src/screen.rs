//! Window selection and result assembly.
//!
//! Given the indicator-complete sequence of length `L`:
//! - the entry window is `min(W, L-1)`: every scored day needs a predecessor;
//! - the exit window is `min(V, L-1)`, and its reference price is the close of
//!   the bar just before the window;
//! - both tables are returned most recent first.
//!
//! A window narrowed by short history is reported on the table, never raised
//! as an error.

use crate::config::ScreenerConfig;
use crate::data::{dataset_hash, ingest, RawBar};
use crate::domain::{Bar, IndicatorBar, ScoredDay};
use crate::error::ScreenError;
use crate::indicators::{self, IndicatorWindows};
use crate::signals::{EntryRules, ExitRules};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One ranked table of scored days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTable {
    /// Most recent first.
    pub rows: Vec<ScoredDay>,
    pub requested_window: usize,
    pub effective_window: usize,
    /// True when history was too short for the requested window.
    pub narrowed: bool,
    /// Mean score over `rows`; `None` when the table is empty.
    pub mean_score: Option<f64>,
}

impl SignalTable {
    fn new(rows: Vec<ScoredDay>, requested_window: usize, effective_window: usize) -> Self {
        let mean_score = if rows.is_empty() {
            None
        } else {
            Some(rows.iter().map(|r| r.score).sum::<f64>() / rows.len() as f64)
        };
        Self {
            rows,
            requested_window,
            effective_window,
            narrowed: effective_window < requested_window,
            mean_score,
        }
    }
}

/// Entry and exit tables for one indicator sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub entries: SignalTable,
    pub exits: SignalTable,
    /// Close of the bar preceding the exit window; `None` if that window is empty.
    pub reference_price: Option<f64>,
}

/// Full result of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    pub ticker: String,
    /// Date of the most recent scored bar.
    pub as_of: Option<NaiveDate>,
    pub windows: IndicatorWindows,
    /// BLAKE3 over the validated input bars.
    pub dataset_hash: String,
    pub bar_count: usize,
    pub indicator_bar_count: usize,
    pub reference_price: Option<f64>,
    pub entries: SignalTable,
    pub exits: SignalTable,
}

impl ScreenReport {
    pub fn narrowed(&self) -> bool {
        self.entries.narrowed || self.exits.narrowed
    }
}

/// Largest usable trailing window for a sequence of `len` indicator bars.
pub fn effective_window(requested: usize, len: usize) -> usize {
    requested.min(len.saturating_sub(1))
}

/// Score the last `window` days against their predecessors.
pub fn score_entries(ibars: &[IndicatorBar], window: usize, rules: &EntryRules) -> SignalTable {
    let effective = effective_window(window, ibars.len());
    let first = ibars.len() - effective;

    let rows = (first..ibars.len())
        .rev()
        .map(|i| {
            let day = &ibars[i];
            let scored = rules.evaluate(day, &ibars[i - 1]);
            ScoredDay::new(day.date(), day.close(), scored.score, scored.traits)
        })
        .collect();

    SignalTable::new(rows, window, effective)
}

/// Score the last `window` days against the close just before the window.
pub fn score_exits(
    ibars: &[IndicatorBar],
    window: usize,
    rules: &ExitRules,
) -> (SignalTable, Option<f64>) {
    let effective = effective_window(window, ibars.len());
    if effective == 0 {
        return (SignalTable::new(Vec::new(), window, 0), None);
    }

    let first = ibars.len() - effective;
    let reference_price = ibars[first - 1].close();

    let rows = ibars[first..]
        .iter()
        .rev()
        .map(|day| {
            let scored = rules.evaluate(day, reference_price);
            ScoredDay::new(day.date(), day.close(), scored.score, scored.traits)
        })
        .collect();

    (SignalTable::new(rows, window, effective), Some(reference_price))
}

/// Build both tables from an indicator-complete sequence.
pub fn evaluate(ibars: &[IndicatorBar], config: &ScreenerConfig) -> Evaluation {
    let windows = config.windows();
    let entries = score_entries(ibars, config.entry_window, &EntryRules::new(&windows));
    let (exits, reference_price) =
        score_exits(ibars, config.exit_window, &ExitRules::new(&windows));

    for (name, table) in [("entry", &entries), ("exit", &exits)] {
        if table.narrowed {
            warn!(
                table = name,
                requested = table.requested_window,
                effective = table.effective_window,
                indicator_bars = ibars.len(),
                "window narrowed by insufficient history"
            );
        }
    }

    Evaluation {
        entries,
        exits,
        reference_price,
    }
}

/// Screen a bar sequence that is already ascending and sane.
///
/// An unordered, duplicated or malformed sequence is `MalformedInput`; use
/// [`run_raw`] to have provider rows sorted and repaired first.
pub fn run(
    ticker: &str,
    bars: &[Bar],
    config: &ScreenerConfig,
) -> Result<ScreenReport, ScreenError> {
    config.validate()?;
    ingest::check_sequence(ticker, bars)?;

    let windows = config.windows();
    let ibars = indicators::compute(bars, &windows);
    let evaluation = evaluate(&ibars, config);

    debug!(
        ticker,
        bars = bars.len(),
        indicator_bars = ibars.len(),
        entry_window = evaluation.entries.effective_window,
        exit_window = evaluation.exits.effective_window,
        "screen evaluated"
    );

    Ok(ScreenReport {
        ticker: ticker.to_string(),
        as_of: ibars.last().map(IndicatorBar::date),
        windows,
        dataset_hash: dataset_hash(bars.iter().map(|b| (b.date, b.ohlcv()))),
        bar_count: bars.len(),
        indicator_bar_count: ibars.len(),
        reference_price: evaluation.reference_price,
        entries: evaluation.entries,
        exits: evaluation.exits,
    })
}

/// Validate raw provider rows, then screen them.
pub fn run_raw(
    ticker: &str,
    raw: Vec<RawBar>,
    config: &ScreenerConfig,
) -> Result<ScreenReport, ScreenError> {
    let bars = ingest::validate(ticker, raw)?;
    run(ticker, &bars, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn config(entry_window: usize, exit_window: usize) -> ScreenerConfig {
        ScreenerConfig {
            entry_window,
            exit_window,
            short_sma_period: 2,
            long_sma_period: 3,
            rvol_period: 3,
            ..Default::default()
        }
    }

    fn rising(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn effective_window_rules() {
        assert_eq!(effective_window(5, 10), 5);
        assert_eq!(effective_window(5, 4), 3);
        assert_eq!(effective_window(5, 1), 0);
        assert_eq!(effective_window(5, 0), 0);
    }

    #[test]
    fn tables_are_most_recent_first() {
        let report = run("TEST", &rising(12), &config(4, 4)).unwrap();
        assert_eq!(report.entries.rows.len(), 4);
        assert!(report.entries.rows.windows(2).all(|w| w[0].date > w[1].date));
        assert!(report.exits.rows.windows(2).all(|w| w[0].date > w[1].date));
        assert_eq!(report.as_of, Some(report.entries.rows[0].date));
    }

    #[test]
    fn reference_price_is_close_before_exit_window() {
        let bars = rising(12);
        let report = run("TEST", &bars, &config(3, 4)).unwrap();
        // 12 bars, warmup 3 → 10 indicator bars; window 4 → reference is bars[7]
        assert_eq!(report.indicator_bar_count, 10);
        assert_eq!(report.reference_price, Some(bars[7].close));
        // rising closes never fall below the reference or the short SMA
        assert!(report.exits.rows.iter().all(|r| r.score == 0.0));
        assert_eq!(report.exits.mean_score, Some(0.0));
    }

    #[test]
    fn narrows_when_history_is_short() {
        // 5 bars, warmup 3 → 3 indicator bars → at most 2 scored days
        let report = run("TEST", &rising(5), &config(5, 5)).unwrap();
        assert_eq!(report.entries.effective_window, 2);
        assert_eq!(report.exits.effective_window, 2);
        assert!(report.entries.narrowed && report.exits.narrowed);
        assert!(report.narrowed());
        assert_eq!(report.entries.rows.len(), 2);
    }

    #[test]
    fn no_eligible_days_gives_empty_tables() {
        let report = run("TEST", &rising(2), &config(5, 5)).unwrap();
        assert_eq!(report.indicator_bar_count, 0);
        assert!(report.entries.rows.is_empty());
        assert!(report.exits.rows.is_empty());
        assert_eq!(report.entries.mean_score, None);
        assert_eq!(report.reference_price, None);
        assert_eq!(report.as_of, None);
    }

    #[test]
    fn single_indicator_bar_gives_empty_tables() {
        let report = run("TEST", &rising(3), &config(5, 5)).unwrap();
        assert_eq!(report.indicator_bar_count, 1);
        assert!(report.entries.rows.is_empty());
        assert!(report.exits.rows.is_empty());
    }

    #[test]
    fn rising_series_scores_entries() {
        let report = run("TEST", &rising(12), &config(3, 3)).unwrap();
        let latest = &report.entries.rows[0];
        // make_bars: open = previous close, so every rising day is bullish,
        // above both SMAs, and makes a higher high and higher low.
        assert_eq!(
            latest.traits,
            vec![
                "Bullish candle",
                "Above 2-period SMA",
                "Above 3-period SMA",
                "Bullish continuation",
            ]
        );
        assert_eq!(latest.score, 4.0);
        assert_eq!(report.entries.mean_score, Some(4.0));
    }

    #[test]
    fn empty_bars_is_error() {
        let err = run("TEST", &[], &config(5, 5)).unwrap_err();
        assert!(matches!(err, ScreenError::EmptyInput { .. }));
    }

    #[test]
    fn invalid_config_is_error() {
        let err = run("TEST", &rising(12), &config(0, 5)).unwrap_err();
        assert!(matches!(err, ScreenError::Config(_)));
    }
}
