//! CSV import provider.
//!
//! Reads a daily history export with a header row containing at least
//! `Date,Open,High,Low,Close,Volume` (case-insensitive; extra columns such as
//! `Adj Close` are ignored). Dates are `YYYY-MM-DD`. Blank or unparseable
//! numeric cells become NaN so ingest can drop the row on its own.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::NaiveDate;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

const REQUIRED: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse every row of a CSV history, in file order.
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<RawBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut idx = [0usize; 6];
    for (slot, name) in idx.iter_mut().zip(REQUIRED) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
            })?;
    }
    let [date_i, open_i, high_i, low_i, close_i, volume_i] = idx;

    let mut bars = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_i).unwrap_or_default();
        let date = match parse_date(raw_date) {
            Some(date) => date,
            None => {
                warn!(row = line + 1, value = raw_date, "skipping CSV row with bad date");
                continue;
            }
        };
        let num = |i: usize| {
            record
                .get(i)
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        bars.push(RawBar {
            date,
            open: num(open_i),
            high: num(high_i),
            low: num(low_i),
            close: num(close_i),
            volume: num(volume_i),
        });
    }

    Ok(bars)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        info!(symbol, path = %self.path.display(), "reading bars from CSV");
        let file = std::fs::File::open(&self.path)?;
        let bars = read_bars(file)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_standard_export() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2024-01-02,40.0,41.0,39.5,40.5,40.5,1000\n\
                   2024-01-03,40.5,42.0,40.0,41.5,41.5,1500\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].high, 42.0);
        assert_eq!(bars[1].volume, 1500.0);
    }

    #[test]
    fn header_match_is_case_insensitive_and_order_free() {
        let csv = "volume,close,low,high,open,date\n1000,40.5,39.5,41.0,40.0,2024-01-02\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars[0].open, 40.0);
        assert_eq!(bars[0].close, 40.5);
    }

    #[test]
    fn missing_column_is_error() {
        let csv = "Date,Open,High,Low,Close\n2024-01-02,40.0,41.0,39.5,40.5\n";
        let err = read_bars(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column } if column == "volume"));
    }

    #[test]
    fn blank_cells_become_nan_and_bad_dates_are_skipped() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-02,40.0,41.0,39.5,,1000\n\
                   not-a-date,40.0,41.0,39.5,40.5,1000\n\
                   2024-01-04 00:00:00,40.0,41.0,39.5,40.5,1000\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].close.is_nan());
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }
}
