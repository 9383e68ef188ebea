//! Terminal error conditions of a screen refresh.
//!
//! Insufficient history and undefined indicators are deliberately absent:
//! those narrow the result tables or skip single days instead of failing.

use crate::config::ConfigError;
use crate::data::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("no bars returned for '{ticker}'")]
    EmptyInput { ticker: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(DataError),
}

impl From<DataError> for ScreenError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::MissingColumn { column } => {
                ScreenError::MalformedInput(format!("missing required column '{column}'"))
            }
            other => ScreenError::Data(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_maps_to_malformed_input() {
        let err: ScreenError = DataError::MissingColumn {
            column: "close".into(),
        }
        .into();
        assert!(matches!(err, ScreenError::MalformedInput(ref m) if m.contains("close")));
    }

    #[test]
    fn other_data_errors_pass_through() {
        let err: ScreenError = DataError::CircuitBreakerTripped.into();
        assert!(matches!(err, ScreenError::Data(DataError::CircuitBreakerTripped)));
    }
}
