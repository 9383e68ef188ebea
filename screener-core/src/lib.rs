//! Screener Core: entry/exit signal engine for a single instrument.
//!
//! - Domain types (bars, indicator bars, scored days)
//! - Indicator pipeline (short/long SMA, relative volume)
//! - Entry and exit rule sets producing scores and trait labels
//! - Window selection and result assembly into two ranked tables
//! - Data retrieval collaborators: providers, range fallback, TTL cache
//!
//! The engine itself (`indicators`, `signals`, `screen`) is pure: no I/O, no
//! state carried between calls. Everything that touches the network or the
//! filesystem lives under `data`.

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod screen;
pub mod signals;

pub use config::{ConfigError, ScreenerConfig};
pub use error::ScreenError;
pub use screen::{ScreenReport, SignalTable};
