//! Input boundary: raw provider rows in, validated bars out.
//!
//! - Empty input is a terminal condition (`EmptyInput`).
//! - Rows are sorted ascending by date; a repeated date is `MalformedInput`.
//! - A row with a missing or impossible value (NaN, non-positive price,
//!   high < low, negative volume) is dropped on its own.
//!
//! Bars handed straight to the screen skip that repair step, so
//! [`check_sequence`] only verifies them.

use super::provider::RawBar;
use crate::domain::Bar;
use crate::error::ScreenError;
use tracing::warn;

/// Validate `raw` rows for `ticker` into an ascending, duplicate-free bar sequence.
pub fn validate(ticker: &str, mut raw: Vec<RawBar>) -> Result<Vec<Bar>, ScreenError> {
    if raw.is_empty() {
        return Err(ScreenError::EmptyInput {
            ticker: ticker.to_string(),
        });
    }

    raw.sort_by_key(|r| r.date);
    if let Some(pair) = raw.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ScreenError::MalformedInput(format!(
            "duplicate date {} in bars for '{ticker}'",
            pair[0].date
        )));
    }

    let total = raw.len();
    let bars: Vec<Bar> = raw
        .into_iter()
        .map(|r| Bar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        })
        .filter(|bar| {
            let ok = bar.is_sane();
            if !ok {
                warn!(ticker, date = %bar.date, "dropping malformed bar");
            }
            ok
        })
        .collect();

    if bars.len() < total {
        warn!(ticker, dropped = total - bars.len(), kept = bars.len(), "malformed bars dropped");
    }

    if bars.is_empty() {
        return Err(ScreenError::EmptyInput {
            ticker: ticker.to_string(),
        });
    }

    Ok(bars)
}

/// Verify an already-built sequence: non-empty, strictly ascending by date,
/// every bar sane.
pub fn check_sequence(ticker: &str, bars: &[Bar]) -> Result<(), ScreenError> {
    if bars.is_empty() {
        return Err(ScreenError::EmptyInput {
            ticker: ticker.to_string(),
        });
    }

    if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(ScreenError::MalformedInput(format!(
            "bars for '{ticker}' not strictly ascending: {} followed by {}",
            pair[0].date, pair[1].date
        )));
    }

    if let Some(bar) = bars.iter().find(|b| !b.is_sane()) {
        return Err(ScreenError::MalformedInput(format!(
            "bar for '{ticker}' on {} has an invalid price or volume",
            bar.date
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(day: u32, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 40.0,
            high: 45.0,
            low: 35.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn empty_is_terminal() {
        let err = validate("GBTC", vec![]).unwrap_err();
        assert!(matches!(err, ScreenError::EmptyInput { ref ticker } if ticker == "GBTC"));
    }

    #[test]
    fn sorts_ascending() {
        let bars = validate("GBTC", vec![raw(4, 41.0), raw(2, 40.0), raw(3, 40.5)]).unwrap();
        let days: Vec<u32> = bars.iter().map(|b| chrono::Datelike::day(&b.date)).collect();
        assert_eq!(days, vec![2, 3, 4]);
    }

    #[test]
    fn duplicate_date_is_malformed() {
        let err = validate("GBTC", vec![raw(2, 40.0), raw(2, 41.0)]).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedInput(_)));
    }

    #[test]
    fn malformed_rows_dropped_individually() {
        let mut bad_volume = raw(4, 41.0);
        bad_volume.volume = f64::NAN;
        let bars = validate(
            "GBTC",
            vec![raw(2, 40.0), raw(3, f64::NAN), bad_volume, raw(5, -1.0), raw(8, 42.0)],
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 42.0);
    }

    fn bar(day: u32) -> Bar {
        let r = raw(day, 40.0);
        Bar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        }
    }

    #[test]
    fn ascending_sane_sequence_passes() {
        assert!(check_sequence("GBTC", &[bar(2), bar(3), bar(5)]).is_ok());
    }

    #[test]
    fn out_of_order_sequence_is_malformed() {
        let err = check_sequence("GBTC", &[bar(3), bar(2)]).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedInput(_)));
        let err = check_sequence("GBTC", &[bar(2), bar(2)]).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedInput(_)));
    }

    #[test]
    fn insane_bar_in_sequence_is_malformed() {
        let mut bad = bar(3);
        bad.high = 30.0;
        let err = check_sequence("GBTC", &[bar(2), bad]).unwrap_err();
        assert!(matches!(err, ScreenError::MalformedInput(ref m) if m.contains("2024-01-03")));
    }

    #[test]
    fn empty_sequence_is_empty_input() {
        let err = check_sequence("GBTC", &[]).unwrap_err();
        assert!(matches!(err, ScreenError::EmptyInput { .. }));
    }

    #[test]
    fn all_rows_malformed_is_empty_input() {
        let err = validate("GBTC", vec![raw(2, f64::NAN)]).unwrap_err();
        assert!(matches!(err, ScreenError::EmptyInput { .. }));
    }
}
