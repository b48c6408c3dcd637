//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No metro in flags, environment, or settings.
    #[error("metro is unset (use --metro, KRAFTCLOUD_METRO or `config set-metro`)")]
    MetroUnset,

    /// No token in flags, environment, or keychain.
    #[error("no token found (use --token, KRAFTCLOUD_TOKEN or `config set-token`)")]
    TokenNotFound,

    /// Core validation error.
    #[error(transparent)]
    Core(#[from] kraftquota_core::CoreError),

    /// Keychain error.
    #[error("keychain error: {0}")]
    Keychain(#[from] kraftquota_fetch::KeychainError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
