//! HTTP client with tracing and bearer authentication.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - A fixed user agent and request timeout
//! - Bearer-token GET requests for the users API

use kraftquota_core::TokenAuth;
use reqwest::{Client, Response, header};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{FetchError, HttpError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shortest accepted request timeout; a zero timeout fails every request.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// User agent string for kraftquota.
const USER_AGENT: &str = concat!("kraftquota/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and a request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout, raised to at least
    /// [`MIN_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let timeout = timeout.max(MIN_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    /// Returns the configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request with a bearer credential.
    #[instrument(skip(self, auth), fields(url = %url))]
    pub async fn get_with_auth(&self, url: &str, auth: &TokenAuth) -> Result<Response, FetchError> {
        let value = header::HeaderValue::from_str(&auth.header_value())
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .header(header::AUTHORIZATION, value)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
