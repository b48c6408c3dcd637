//! Authentication types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Resolved credentials for the users API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Account user name, when known.
    pub user: Option<String>,
    /// Secret token.
    pub token: String,
}

impl AuthConfig {
    /// Creates an auth config from a user and secret.
    pub fn new(user: Option<String>, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    /// Parses a token as given on the command line or in the environment.
    ///
    /// Tokens are usually `base64(user:secret)`; those are split into user and
    /// secret. Anything else is kept as an opaque secret.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidToken` if the token is blank.
    pub fn from_token(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::InvalidToken("token is empty".to_string()));
        }

        let decoded = STANDARD
            .decode(raw)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());

        if let Some((user, secret)) = decoded.as_deref().and_then(|s| s.split_once(':')) {
            if !user.is_empty() && !secret.is_empty() {
                return Ok(Self::new(Some(user.to_string()), secret));
            }
        }

        Ok(Self::new(None, raw))
    }

    /// Returns the bearer credential for this config.
    pub fn token_auth(&self) -> TokenAuth {
        match &self.user {
            Some(user) => TokenAuth(STANDARD.encode(format!("{user}:{}", self.token))),
            None => TokenAuth(self.token.clone()),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Bearer credential sent in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenAuth(String);

impl TokenAuth {
    /// Wraps an already-encoded bearer value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Returns the raw bearer value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenAuth(<redacted>)")
    }
}
