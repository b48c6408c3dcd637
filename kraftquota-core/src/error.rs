//! Core error types for `kraftquota`.

use thiserror::Error;

/// Core error type for `kraftquota` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unrecognized `--output` value.
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// Metro identifier that cannot name a region.
    #[error("invalid metro: {0}")]
    InvalidMetro(String),

    /// Token that cannot be used as a bearer credential.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Invalid data from API response.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
