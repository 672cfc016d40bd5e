//! Error types for the agenda widget core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WidgetError>;

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid birthday pattern `{pattern}`: {source}")]
    InvalidBirthdayPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid date pattern `{0}`")]
    InvalidDatePattern(String),

    #[error("timestamp {0} is outside the supported calendar range")]
    TimestampOutOfRange(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
