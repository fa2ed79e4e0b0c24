/// Core error types for Couch Player
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Couch Player value validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Progress outside 0-100 or not a number
    #[error("Invalid progress: {0}")]
    InvalidProgress(f64),

    /// Time range with end before start, or non-finite bounds
    #[error("Invalid time range: [{start}, {end})")]
    InvalidTimeRange { start: f64, end: f64 },

    /// Empty identifier
    #[error("Empty {0} id")]
    EmptyId(&'static str),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
