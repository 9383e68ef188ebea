//! Bar retrieval: TTL cache in front of a provider, with range fallback.
//!
//! A provider may return nothing for the requested range (a thinly traded
//! instrument, a holiday-heavy window, a provider hiccup). The fetch then
//! widens the range to 2x and 4x the requested lookback before giving up.

use super::cache::{BarCache, CacheKey};
use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{DateTime, Duration as DateSpan, NaiveDate, Utc};
use std::time::Duration;
use tracing::{info, warn};

/// Lookback multipliers tried in order.
pub const FALLBACK_MULTIPLIERS: [u32; 3] = [1, 2, 4];

/// One refresh's worth of bar requirements.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticker: String,
    pub end: NaiveDate,
    pub lookback_days: u32,
    pub ttl: Duration,
}

impl FetchRequest {
    pub fn start(&self) -> NaiveDate {
        range_start(self.end, self.lookback_days)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.ticker, self.start(), self.end)
    }
}

fn range_start(end: NaiveDate, days: u32) -> NaiveDate {
    end - DateSpan::days(i64::from(days))
}

/// Bars handed to the screen, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<RawBar>,
    /// Provider that originally produced the rows.
    pub source: DataSource,
    pub from_cache: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Fetch `symbol` ending at `end`, widening the range while the result is empty.
///
/// Returns the first non-empty result and the start date it was fetched from.
/// Symbol-not-found, missing columns and a tripped breaker end the search at
/// once; other errors move on to the next range. If every range comes back
/// empty, the last (empty) result is returned so the caller can report it.
pub fn fetch_with_fallback(
    provider: &dyn DataProvider,
    symbol: &str,
    end: NaiveDate,
    lookback_days: u32,
) -> Result<(FetchResult, NaiveDate), DataError> {
    let mut last_empty = None;
    let mut last_error = None;

    for (attempt, multiplier) in FALLBACK_MULTIPLIERS.iter().enumerate() {
        let start = range_start(end, lookback_days.saturating_mul(*multiplier));

        if !provider.is_available() {
            return Err(DataError::CircuitBreakerTripped);
        }

        if attempt > 0 {
            warn!(symbol, %start, %end, provider = provider.name(), "retrying with a wider range");
        }

        match provider.fetch(symbol, start, end) {
            Ok(result) if !result.bars.is_empty() => return Ok((result, start)),
            Ok(result) => {
                warn!(symbol, %start, %end, "provider returned no bars");
                last_empty = Some((result, start));
            }
            Err(
                e @ (DataError::SymbolNotFound { .. }
                | DataError::MissingColumn { .. }
                | DataError::CircuitBreakerTripped),
            ) => return Err(e),
            Err(e) => {
                warn!(symbol, %start, error = %e, "fetch failed");
                last_error = Some(e);
            }
        }
    }

    match (last_empty, last_error) {
        (Some(empty), _) => Ok(empty),
        (None, Some(e)) => Err(e),
        (None, None) => Err(DataError::Other("no fetch attempted".into())),
    }
}

/// Load bars for a refresh: cache hit if fresh, otherwise fetch and cache.
///
/// A failed cache write is logged and otherwise ignored.
pub fn load_bars(
    provider: &dyn DataProvider,
    cache: Option<&BarCache>,
    request: &FetchRequest,
    now: DateTime<Utc>,
) -> Result<LoadedBars, DataError> {
    let key = request.cache_key();

    if let Some(cache) = cache {
        if let Some(hit) = cache.get(&key, request.ttl, now)? {
            info!(ticker = %request.ticker, bars = hit.bars.len(), "cache hit");
            return Ok(LoadedBars {
                bars: hit.bars,
                source: hit.meta.source,
                from_cache: true,
                start: hit.meta.fetched_start,
                end: key.end,
            });
        }
        info!(ticker = %request.ticker, "cache miss");
    }

    let (fetched, start) =
        fetch_with_fallback(provider, &request.ticker, request.end, request.lookback_days)?;

    if let Some(cache) = cache {
        if !fetched.bars.is_empty() {
            if let Err(e) = cache.put(&key, &fetched, start, now) {
                warn!(error = %e, "failed to write bar cache");
            }
        }
    }

    Ok(LoadedBars {
        source: fetched.source,
        bars: fetched.bars,
        from_cache: false,
        start,
        end: request.end,
    })
}
