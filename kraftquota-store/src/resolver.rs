//! Metro, token, and credential resolution.
//!
//! Sources, highest priority first:
//!
//! 1. **Flags** - `--metro`, `--token`
//! 2. **Environment** - `KRAFTCLOUD_METRO`, `KRAFTCLOUD_TOKEN`
//! 3. **Settings / keychain** - `default_metro`, `user` + stored secret

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kraftquota_core::{AuthConfig, Metro};
use kraftquota_fetch::KeychainApi;
use kraftquota_fetch::host::keychain::{accounts, services};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::settings_store::{Settings, SettingsStore};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable for the metro.
pub const METRO_ENV: &str = "KRAFTCLOUD_METRO";

/// Environment variable for the token.
pub const TOKEN_ENV: &str = "KRAFTCLOUD_TOKEN";

// ============================================================================
// Environment
// ============================================================================

/// Read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    /// Returns the variable's value, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Treats blank values as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Resolver
// ============================================================================

/// Metro and (optional) token resolved before a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetroToken {
    /// Target metro.
    pub metro: Metro,
    /// Token from flags or environment; `None` defers to stored credentials.
    pub token: Option<String>,
}

/// Ambient configuration lookup.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Resolves the target metro and any explicitly supplied token.
    fn populate_metro_token(&self) -> Result<MetroToken, StoreError>;

    /// Resolves credentials for `token`, falling back to stored ones.
    async fn auth_config(&self, token: Option<&str>) -> Result<AuthConfig, StoreError>;
}

#[async_trait]
impl<T: ConfigResolver + ?Sized> ConfigResolver for &T {
    fn populate_metro_token(&self) -> Result<MetroToken, StoreError> {
        (**self).populate_metro_token()
    }

    async fn auth_config(&self, token: Option<&str>) -> Result<AuthConfig, StoreError> {
        (**self).auth_config(token).await
    }
}

/// Resolver over flags, environment, settings, and keychain.
#[derive(Clone)]
pub struct EnvConfigResolver {
    settings: Settings,
    keychain: Arc<dyn KeychainApi>,
    env: Arc<dyn EnvSource>,
    metro_flag: Option<String>,
    token_flag: Option<String>,
}

impl EnvConfigResolver {
    /// Creates a resolver reading the process environment.
    pub fn new(settings: Settings, keychain: Arc<dyn KeychainApi>) -> Self {
        Self {
            settings,
            keychain,
            env: Arc::new(ProcessEnv),
            metro_flag: None,
            token_flag: None,
        }
    }

    /// Replaces the environment source.
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Sets values given on the command line.
    pub fn with_flags(mut self, metro: Option<String>, token: Option<String>) -> Self {
        self.metro_flag = metro;
        self.token_flag = token;
        self
    }

    fn resolve_metro(&self) -> Result<Metro, StoreError> {
        if let Some(metro) = non_empty(self.metro_flag.clone()) {
            debug!(source = "flag", "Resolved metro");
            return Ok(Metro::new(&metro)?);
        }
        if let Some(metro) = non_empty(self.env.var(METRO_ENV)) {
            debug!(source = "env", "Resolved metro");
            return Ok(Metro::new(&metro)?);
        }
        if let Some(metro) = &self.settings.default_metro {
            debug!(source = "settings", "Resolved metro");
            return Ok(metro.clone());
        }
        Err(StoreError::MetroUnset)
    }

    fn resolve_token(&self) -> Option<String> {
        non_empty(self.token_flag.clone()).or_else(|| non_empty(self.env.var(TOKEN_ENV)))
    }
}

impl std::fmt::Debug for EnvConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfigResolver")
            .field("settings", &self.settings)
            .field("metro_flag", &self.metro_flag)
            .field("token_flag", &self.token_flag.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConfigResolver for EnvConfigResolver {
    fn populate_metro_token(&self) -> Result<MetroToken, StoreError> {
        Ok(MetroToken {
            metro: self.resolve_metro()?,
            token: self.resolve_token(),
        })
    }

    #[instrument(skip(self, token), fields(explicit = token.is_some()))]
    async fn auth_config(&self, token: Option<&str>) -> Result<AuthConfig, StoreError> {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            debug!(source = "token", "Resolved credentials");
            return Ok(AuthConfig::from_token(token)?);
        }

        let user = self.settings.user.clone();
        let account = user.as_deref().unwrap_or(accounts::TOKEN);
        let secret = self
            .keychain
            .get(services::KRAFTCLOUD, account)
            .await?
            .ok_or(StoreError::TokenNotFound)?;

        debug!(source = "keychain", "Resolved credentials");
        match user {
            Some(user) => Ok(AuthConfig::new(Some(user), secret)),
            None => Ok(AuthConfig::from_token(&secret)?),
        }
    }
}

// ============================================================================
// Token Storage
// ============================================================================

/// Stores `token` for later runs and returns the parsed credentials.
///
/// A `user:secret` token also records the user in the settings; the secret
/// goes to the keychain under that user.
pub async fn store_token(
    store: &SettingsStore,
    keychain: &dyn KeychainApi,
    token: &str,
) -> Result<AuthConfig, StoreError> {
    let auth = AuthConfig::from_token(token)?;

    let account = match &auth.user {
        Some(user) => {
            let recorded = user.clone();
            store.update(move |s| s.user = Some(recorded)).await;
            store.save().await?;
            user.clone()
        }
        None => store
            .get()
            .await
            .user
            .unwrap_or_else(|| accounts::TOKEN.to_string()),
    };

    keychain
        .set(services::KRAFTCLOUD, &account, &auth.token)
        .await?;
    debug!(account = %account, "Token stored");
    Ok(auth)
}

/// Removes the stored token of the configured account.
///
/// Returns `false` if no token was stored.
pub async fn clear_token(settings: &Settings, keychain: &dyn KeychainApi) -> Result<bool, StoreError> {
    let account = settings.user.as_deref().unwrap_or(accounts::TOKEN);
    if !keychain.exists(services::KRAFTCLOUD, account).await {
        return Ok(false);
    }

    keychain.delete(services::KRAFTCLOUD, account).await?;
    debug!(account = %account, "Token removed");
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kraftquota_fetch::MemoryKeychain;

    fn env(pairs: &[(&str, &str)]) -> Arc<dyn EnvSource> {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn resolver(settings: Settings, pairs: &[(&str, &str)]) -> EnvConfigResolver {
        EnvConfigResolver::new(settings, Arc::new(MemoryKeychain::new())).with_env(env(pairs))
    }

    #[test]
    fn test_metro_flag_wins() {
        let resolver = resolver(Settings::default(), &[(METRO_ENV, "was1")])
            .with_flags(Some("fra0".to_string()), None);
        let resolved = resolver.populate_metro_token().unwrap();
        assert_eq!(resolved.metro.as_str(), "fra0");
    }

    #[test]
    fn test_metro_from_env() {
        let resolver = resolver(Settings::default(), &[(METRO_ENV, "was1"), (TOKEN_ENV, "tok")]);
        let resolved = resolver.populate_metro_token().unwrap();
        assert_eq!(resolved.metro.as_str(), "was1");
        assert_eq!(resolved.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_metro_from_settings() {
        let settings = Settings {
            default_metro: Some(Metro::new("sin0").unwrap()),
            ..Default::default()
        };
        let resolved = resolver(settings, &[(METRO_ENV, "")]).populate_metro_token().unwrap();
        assert_eq!(resolved.metro.as_str(), "sin0");
        assert_eq!(resolved.token, None);
    }

    #[test]
    fn test_metro_unset() {
        let err = resolver(Settings::default(), &[]).populate_metro_token().unwrap_err();
        assert!(matches!(err, StoreError::MetroUnset));
    }

    #[test]
    fn test_invalid_metro_flag() {
        let err = resolver(Settings::default(), &[])
            .with_flags(Some("fra0.example.com".to_string()), None)
            .populate_metro_token()
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(_)));
    }

    #[tokio::test]
    async fn test_auth_config_from_explicit_token() {
        let auth = resolver(Settings::default(), &[])
            .auth_config(Some("raw-token"))
            .await
            .unwrap();
        assert_eq!(auth.token, "raw-token");
    }

    #[tokio::test]
    async fn test_auth_config_from_keychain() {
        let keychain = Arc::new(MemoryKeychain::new());
        keychain.set(services::KRAFTCLOUD, "alice", "s3cret").await.unwrap();

        let settings = Settings {
            user: Some("alice".to_string()),
            ..Default::default()
        };
        let auth = EnvConfigResolver::new(settings, keychain)
            .with_env(env(&[]))
            .auth_config(None)
            .await
            .unwrap();

        assert_eq!(auth.user.as_deref(), Some("alice"));
        assert_eq!(auth.token, "s3cret");
    }

    #[tokio::test]
    async fn test_auth_config_missing() {
        let err = resolver(Settings::default(), &[]).auth_config(None).await.unwrap_err();
        assert!(matches!(err, StoreError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_store_token_records_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let keychain = MemoryKeychain::new();

        // base64("bob:hunter2")
        let auth = store_token(&store, &keychain, "Ym9iOmh1bnRlcjI=").await.unwrap();

        assert_eq!(auth.user.as_deref(), Some("bob"));
        assert_eq!(store.get().await.user.as_deref(), Some("bob"));
        assert_eq!(
            keychain.get(services::KRAFTCLOUD, "bob").await.unwrap().as_deref(),
            Some("hunter2")
        );
    }

    #[tokio::test]
    async fn test_clear_token() {
        let keychain = MemoryKeychain::new();
        keychain.set(services::KRAFTCLOUD, "bob", "hunter2").await.unwrap();
        let settings = Settings {
            user: Some("bob".to_string()),
            ..Default::default()
        };

        assert!(clear_token(&settings, &keychain).await.unwrap());
        assert_eq!(keychain.get(services::KRAFTCLOUD, "bob").await.unwrap(), None);
        assert!(!clear_token(&settings, &keychain).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_opaque_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let keychain = MemoryKeychain::new();

        store_token(&store, &keychain, "opaque!").await.unwrap();

        assert_eq!(
            keychain.get(services::KRAFTCLOUD, accounts::TOKEN).await.unwrap().as_deref(),
            Some("opaque!")
        );
        assert!(!dir.path().join("settings.json").exists());
    }
}
