//! Error types for request validation.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating an inbound submission.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or blank after trimming.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// The name of the invalid field.
        field: &'static str,
        /// Description of what's wrong.
        reason: String,
    },

    /// Timestamp is older than the replay window allows.
    #[error("timestamp expired: {age_ms}ms old, max {max_age_ms}ms")]
    Expired {
        /// How old the timestamp is, in milliseconds.
        age_ms: i64,
        /// The configured maximum age, in milliseconds.
        max_age_ms: i64,
    },

    /// Timestamp is further in the future than clock skew tolerates.
    #[error("timestamp {ahead_ms}ms in the future")]
    FromFuture {
        /// How far ahead of the server clock the timestamp is.
        ahead_ms: i64,
    },

    /// Recomputed MAC does not match the submitted one.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The signing secret is empty.
    #[error("signing secret is not configured")]
    MissingSecret,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
