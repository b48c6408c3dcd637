//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for users API operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Authentication rejected by the API.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Non-success HTTP status.
    #[error("HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// API message or status text.
        message: String,
    },

    /// The API answered with an error envelope.
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client has no metro to target.
    #[error("no metro set on client")]
    MissingMetro,

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP client construction or header error.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        match io_error_kind(&err) {
            Some(kind) if err.is_connect() => FetchError::Request(format!("{kind}: {}", error_chain(&err))),
            _ => FetchError::Request(error_chain(&err)),
        }
    }
}

/// Finds the kind of the first I/O error in an error's source chain.
fn io_error_kind(err: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        current = e.source();
    }
    None
}

/// Joins an error and its sources into one message.
///
/// `reqwest` keeps the interesting part ("connection refused") in the source
/// chain, which its `Display` does not print.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// Header value rejected.
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Access denied.
    #[error("access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}
