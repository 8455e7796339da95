//! Error types for footfall-core

use thiserror::Error;

/// Main error type for the footfall-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Bucket unit outside the supported set
    #[error("invalid granularity: {value:?}, must be one of {allowed}")]
    InvalidGranularity { value: String, allowed: String },

    /// Non-positive leaderboard size
    #[error("limit must be a positive number, got {0}")]
    InvalidLimit(i64),

    /// A record handed to the sorted view lacks the requested sort key
    #[error("record {entity_id} has no sort field {field:?}")]
    MissingSortField { field: String, entity_id: String },

    /// Malformed or unparsable timestamp supplied by the caller
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// One or more required request parameters are absent
    #[error("missing required parameters: {0}")]
    MissingParameter(String),

    /// A request parameter has the wrong shape
    #[error("parameter {name:?} must be {expected}")]
    InvalidParameter { name: String, expected: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for footfall-core
pub type Result<T> = std::result::Result<T, Error>;
