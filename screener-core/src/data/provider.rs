//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, CSV
//! export, synthetic random walk) so the screen can swap implementations and
//! tests can feed fixed histories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV row from a data provider, before validation.
///
/// Missing cells are carried as `f64::NAN` (`null` when serialized); ingest
/// drops such rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    #[serde(with = "nullable_f64")]
    pub open: f64,
    #[serde(with = "nullable_f64")]
    pub high: f64,
    #[serde(with = "nullable_f64")]
    pub low: f64,
    #[serde(with = "nullable_f64")]
    pub close: f64,
    #[serde(with = "nullable_f64")]
    pub volume: f64,
}

impl RawBar {
    pub fn ohlcv(&self) -> [f64; 5] {
        [self.open, self.high, self.low, self.close, self.volume]
    }
}

/// JSON has no NaN: write non-finite values as `null`, read `null` back as NaN.
mod nullable_f64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}

/// Structured error types for data operations.
///
/// Displayable as a single line in the CLI.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful data fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
    Cache,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataSource::YahooFinance => "yahoo_finance",
            DataSource::CsvImport => "csv_import",
            DataSource::Synthetic => "synthetic",
            DataSource::Cache => "cache",
        };
        f.write_str(name)
    }
}

/// Trait for data providers.
///
/// Providers know nothing about the cache; `fetch::load_bars` layers it on top.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Deterministic BLAKE3 hash over dated OHLCV rows, in the order given.
pub fn dataset_hash<I>(rows: I) -> String
where
    I: IntoIterator<Item = (NaiveDate, [f64; 5])>,
{
    let mut hasher = blake3::Hasher::new();
    for (date, values) in rows {
        hasher.update(date.to_string().as_bytes());
        for v in values {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 40.0,
            high: 41.0,
            low: 39.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn nan_roundtrips_through_json_as_null() {
        let json = serde_json::to_string(&raw(f64::NAN)).unwrap();
        assert!(json.contains("\"close\":null"));
        let back: RawBar = serde_json::from_str(&json).unwrap();
        assert!(back.close.is_nan());
        assert_eq!(back.open, 40.0);
    }

    #[test]
    fn dataset_hash_is_order_and_value_sensitive() {
        let a = raw(40.5);
        let b = RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ..raw(41.0)
        };
        let rows = |bars: &[RawBar]| {
            bars.iter()
                .map(|r| (r.date, r.ohlcv()))
                .collect::<Vec<_>>()
        };
        let h1 = dataset_hash(rows(&[a, b]));
        assert_eq!(h1, dataset_hash(rows(&[a, b])));
        assert_ne!(h1, dataset_hash(rows(&[b, a])));
        assert_ne!(h1, dataset_hash(rows(&[a, raw(40.6)])));
    }
}
