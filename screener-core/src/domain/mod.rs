//! Domain types for the screener

pub mod bar;
pub mod indicator_bar;
pub mod scored_day;

pub use bar::Bar;
pub use indicator_bar::IndicatorBar;
pub use scored_day::{round_cents, ScoredDay};

/// Symbol type alias
pub type Symbol = String;
