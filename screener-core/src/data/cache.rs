//! JSON bar cache with an explicit time-to-live.
//!
//! Layout: `{cache_dir}/{TICKER}_{start}_{end}.json`, one file per
//! `(ticker, request range)` key, holding a metadata block and the fetched
//! rows.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Freshness is decided by the caller-supplied `now` against `cached_at`
//! - Corrupt files are removed and treated as a miss

use super::provider::{dataset_hash, DataError, DataSource, FetchResult, RawBar};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// What a cache entry was fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }

    /// File name of this entry inside the cache directory.
    pub fn file_name(&self) -> String {
        let ticker: String = self
            .ticker
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{ticker}_{}_{}.json", self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub key: CacheKey,
    /// First day of the range actually fetched; earlier than `key.start`
    /// when the fetch had to widen the range.
    pub fetched_start: NaiveDate,
    pub cached_at: DateTime<Utc>,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: DataSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedBars {
    pub meta: CacheMeta,
    pub bars: Vec<RawBar>,
}

impl CachedBars {
    /// Entry age at `now`; negative ages (clock moved back) count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.meta.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

pub struct BarCache {
    cache_dir: PathBuf,
}

impl BarCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Return the entry for `key` if it exists and is younger than `ttl`.
    pub fn get(
        &self,
        key: &CacheKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedBars>, DataError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DataError::CacheError(format!("read {}: {e}", path.display()))),
        };

        let entry: CachedBars = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt cache file");
                let _ = fs::remove_file(&path);
                return Ok(None);
            }
        };

        if entry.meta.key != *key {
            warn!(path = %path.display(), "cache file key mismatch, discarding");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        if !entry.is_fresh(ttl, now) {
            debug!(ticker = %key.ticker, age = ?entry.age(now), ?ttl, "cache entry expired");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Store a fetch result under `key`, stamped with `now`.
    pub fn put(
        &self,
        key: &CacheKey,
        fetched: &FetchResult,
        fetched_start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CachedBars, DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let entry = CachedBars {
            meta: CacheMeta {
                key: key.clone(),
                fetched_start,
                cached_at: now,
                bar_count: fetched.bars.len(),
                data_hash: dataset_hash(fetched.bars.iter().map(|b| (b.date, b.ohlcv()))),
                source: fetched.source,
            },
            bars: fetched.bars.clone(),
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| DataError::CacheError(format!("serialize cache entry: {e}")))?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| DataError::CacheError(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        Ok(entry)
    }

    /// Remove every cache entry. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize, DataError> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DataError::CacheError(format!("read dir: {e}"))),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?
                .path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".json") || n.ends_with(".json.tmp"));
            if path.is_file() && is_cache_file {
                fs::remove_file(&path)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", path.display())))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
