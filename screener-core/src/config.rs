//! Screener configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock GBTC screen: 5-day entry and exit windows over 20/50-period SMAs and
//! a 50-day relative-volume window.

use crate::domain::Symbol;
use crate::indicators::IndicatorWindows;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Instrument identifier.
    pub ticker: Symbol,
    /// Trailing days scored by the entry rules.
    pub entry_window: usize,
    /// Trailing days scored by the exit rules.
    pub exit_window: usize,
    pub short_sma_period: usize,
    pub long_sma_period: usize,
    pub rvol_period: usize,
    /// Calendar days of history requested from the data source.
    pub lookback_days: u32,
    /// How long fetched bars stay fresh in the cache.
    pub cache_ttl_secs: u64,
    /// Rows rendered per table (0 = all).
    pub display_rows: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            ticker: "GBTC".to_string(),
            entry_window: 5,
            exit_window: 5,
            short_sma_period: 20,
            long_sma_period: 50,
            rvol_period: 50,
            lookback_days: 180,
            cache_ttl_secs: 3600,
            display_rows: 10,
        }
    }
}

impl ScreenerConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable. Windows and periods must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ticker",
                reason: "must not be empty".into(),
            });
        }

        let positive = [
            ("entry_window", self.entry_window),
            ("exit_window", self.exit_window),
            ("short_sma_period", self.short_sma_period),
            ("long_sma_period", self.long_sma_period),
            ("rvol_period", self.rvol_period),
            ("lookback_days", self.lookback_days as usize),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be >= 1".into(),
                });
            }
        }

        Ok(())
    }

    pub fn windows(&self) -> IndicatorWindows {
        IndicatorWindows {
            short: self.short_sma_period,
            long: self.long_sma_period,
            rvol: self.rvol_period,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
