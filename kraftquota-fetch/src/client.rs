//! Users API client.
//!
//! Talks to the per-metro users API and turns the quotas endpoint's envelope
//! into a [`QuotaReport`].

use async_trait::async_trait;
use kraftquota_core::{Metro, QuotaEntry, QuotaReport, TokenAuth};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::host::http::{DEFAULT_TIMEOUT_SECS, HttpClient};

// ============================================================================
// Constants
// ============================================================================

/// Default API base URL; `{metro}` is replaced with the metro name.
pub const DEFAULT_API_URL: &str = "https://api.{metro}.kraft.cloud/v1";

/// Placeholder substituted in the base URL template.
const METRO_PLACEHOLDER: &str = "{metro}";

/// Quotas endpoint, relative to the base URL.
const QUOTAS_ENDPOINT: &str = "users/quotas";

// ============================================================================
// API Response Types
// ============================================================================

/// Envelope wrapping every users API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: Option<String>,
    message: Option<String>,
    data: Option<T>,
}

/// `data` member of the quotas response.
#[derive(Debug, Deserialize)]
struct QuotasData {
    #[serde(default)]
    quotas: Vec<QuotaEntry>,
}

/// Parses a quotas response body.
fn parse_quotas(body: &str) -> Result<QuotaReport, FetchError> {
    let envelope: ApiResponse<QuotasData> = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Failed to parse quotas response");
        FetchError::InvalidResponse(format!("JSON error: {e}"))
    })?;

    if envelope.status.as_deref() == Some("error") {
        return Err(FetchError::Api(
            envelope
                .message
                .unwrap_or_else(|| "request failed".to_string()),
        ));
    }

    let report = QuotaReport::new(envelope.data.map(|d| d.quotas).unwrap_or_default());
    if report.is_empty() {
        return Err(FetchError::InvalidResponse("no quotas returned".to_string()));
    }
    report
        .all_or_err()
        .map_err(|e| FetchError::Api(e.to_string()))?;

    Ok(report)
}

/// Pulls a human-readable message out of an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|r| r.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

// ============================================================================
// Quotas API
// ============================================================================

/// Remote quota retrieval.
#[async_trait]
pub trait QuotasApi: Send + Sync {
    /// Fetches the quota report for the authenticated account.
    async fn quotas(&self) -> Result<QuotaReport, FetchError>;
}

/// Builds clients scoped to a credential and a metro.
pub trait UsersClientFactory: Send + Sync {
    /// Client type produced by this factory.
    type Client: QuotasApi;

    /// Creates a client for `auth`, targeting `metro`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    fn users_client(&self, auth: TokenAuth, metro: &Metro) -> Result<Self::Client, FetchError>;
}

impl<T: UsersClientFactory + ?Sized> UsersClientFactory for &T {
    type Client = T::Client;

    fn users_client(&self, auth: TokenAuth, metro: &Metro) -> Result<Self::Client, FetchError> {
        (**self).users_client(auth, metro)
    }
}

// ============================================================================
// Users Client
// ============================================================================

/// Users API client.
#[derive(Debug, Clone)]
pub struct UsersClient {
    http: HttpClient,
    auth: TokenAuth,
    base_url: String,
    metro: Option<Metro>,
}

impl UsersClient {
    /// Creates a client with the default base URL and no metro.
    pub fn new(http: HttpClient, auth: TokenAuth) -> Self {
        Self {
            http,
            auth,
            base_url: DEFAULT_API_URL.to_string(),
            metro: None,
        }
    }

    /// Overrides the base URL template.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Scopes the client to a metro.
    pub fn with_metro(mut self, metro: &Metro) -> Self {
        self.metro = Some(metro.clone());
        self
    }

    /// Builds the URL for an endpoint under the metro's base URL.
    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let metro = self.metro.as_ref().ok_or(FetchError::MissingMetro)?;
        let mut base = self.base_url.replace(METRO_PLACEHOLDER, metro.as_str());
        if !base.ends_with('/') {
            base.push('/');
        }

        let base = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
        base.join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl QuotasApi for UsersClient {
    #[instrument(skip(self), fields(metro = ?self.metro))]
    async fn quotas(&self) -> Result<QuotaReport, FetchError> {
        let url = self.endpoint(QUOTAS_ENDPOINT)?;
        debug!(url = %url, "Fetching quotas");

        let response = self.http.get_with_auth(url.as_str(), &self.auth).await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationFailed(error_message(status, &body)));
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let report = parse_quotas(&body)?;
        debug!(entries = report.quotas.len(), "Quotas fetched");
        Ok(report)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Production factory building HTTP-backed [`UsersClient`]s.
#[derive(Debug, Clone)]
pub struct HttpUsersClientFactory {
    base_url: String,
    timeout: Duration,
}

impl HttpUsersClientFactory {
    /// Creates a factory with the default base URL and timeout.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Overrides the base URL template.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the request timeout (see [`crate::host::http::MIN_TIMEOUT`]).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpUsersClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl UsersClientFactory for HttpUsersClientFactory {
    type Client = UsersClient;

    fn users_client(&self, auth: TokenAuth, metro: &Metro) -> Result<UsersClient, FetchError> {
        let http = HttpClient::with_timeout(self.timeout)?;
        Ok(UsersClient::new(http, auth)
            .with_base_url(self.base_url.clone())
            .with_metro(metro))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUOTAS_BODY: &str = r#"{
        "status": "success",
        "data": {
            "quotas": [{
                "status": "success",
                "uuid": "u-1",
                "used": {"instances": 2, "live_instances": 1, "live_memory_mb": 128},
                "hard": {"instances": 16, "live_instances": 16, "live_memory_mb": 4096},
                "limits": {"min_memory_mb": 16, "max_memory_mb": 2048},
                "features": ["scale_to_zero"]
            }]
        }
    }"#;

    fn metro() -> Metro {
        Metro::new("fra0").unwrap()
    }

    fn client_for(server: &MockServer) -> UsersClient {
        HttpUsersClientFactory::new()
            .with_base_url(format!("{}/v1", server.uri()))
            .users_client(TokenAuth::new("tok"), &metro())
            .unwrap()
    }

    #[test]
    fn test_endpoint_substitutes_metro() {
        let client = UsersClient::new(HttpClient::new().unwrap(), TokenAuth::new("tok")).with_metro(&metro());
        let url = client.endpoint(QUOTAS_ENDPOINT).unwrap();
        assert_eq!(url.as_str(), "https://api.fra0.kraft.cloud/v1/users/quotas");
    }

    #[test]
    fn test_endpoint_requires_metro() {
        let client = UsersClient::new(HttpClient::new().unwrap(), TokenAuth::new("tok"));
        assert!(matches!(client.endpoint(QUOTAS_ENDPOINT), Err(FetchError::MissingMetro)));
    }

    #[test]
    fn test_parse_quotas_error_envelope() {
        let err = parse_quotas(r#"{"status": "error", "message": "quota service down"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Api(ref m) if m == "quota service down"));
    }

    #[test]
    fn test_parse_quotas_empty() {
        let err = parse_quotas(r#"{"status": "success", "data": {"quotas": []}}"#).unwrap_err();
        assert!(err.to_string().contains("no quotas returned"));
    }

    #[test]
    fn test_parse_quotas_envelope_without_data() {
        let err = parse_quotas(r#"{"status": "success"}"#).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(ref m) if m == "no quotas returned"));
    }

    #[test]
    fn test_parse_quotas_minimal_envelope() {
        let report = parse_quotas(r#"{"data": {"quotas": [{"uuid": "u-1"}]}}"#).unwrap();
        assert_eq!(report.quotas[0].uuid, "u-1");
    }

    #[test]
    fn test_parse_quotas_entry_error() {
        let body = r#"{"status": "partial_success", "data": {"quotas": [
            {"status": "error", "uuid": "u-1", "message": "user not found"}
        ]}}"#;
        let err = parse_quotas(body).unwrap_err();
        assert!(err.to_string().contains("user not found"));
    }

    #[test]
    fn test_parse_quotas_malformed() {
        let err = parse_quotas("<html>").unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_quotas_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/quotas"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(QUOTAS_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let report = client_for(&server).quotas().await.unwrap();
        assert_eq!(report.quotas.len(), 1);
        assert_eq!(report.quotas[0].used.live_memory_mb, 128);
        assert!(report.quotas[0].has_feature("scale_to_zero"));
    }

    #[tokio::test]
    async fn test_quotas_with_zero_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/quotas"))
            .respond_with(ResponseTemplate::new(200).set_body_string(QUOTAS_BODY))
            .mount(&server)
            .await;

        let report = HttpUsersClientFactory::new()
            .with_base_url(format!("{}/v1", server.uri()))
            .with_timeout(Duration::ZERO)
            .users_client(TokenAuth::new("tok"), &metro())
            .unwrap()
            .quotas()
            .await
            .unwrap();
        assert_eq!(report.quotas.len(), 1);
    }

    #[tokio::test]
    async fn test_quotas_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/quotas"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"status": "error", "message": "invalid token"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).quotas().await.unwrap_err();
        assert!(matches!(err, FetchError::AuthenticationFailed(ref m) if m == "invalid token"));
    }

    #[tokio::test]
    async fn test_quotas_server_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/quotas"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).quotas().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_quotas_connection_refused() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = HttpUsersClientFactory::new()
            .with_base_url(format!("http://127.0.0.1:{port}/v1"))
            .users_client(TokenAuth::new("tok"), &metro())
            .unwrap();

        let err = client.quotas().await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("connection refused"), "{err}");
    }
}
