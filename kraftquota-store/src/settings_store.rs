//! User preferences store.
//!
//! Manages the settings file with persistence.

use kraftquota_core::Metro;
pub use kraftquota_fetch::host::http::DEFAULT_TIMEOUT_SECS;
use kraftquota_fetch::host::http::MIN_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Metro used when neither `--metro` nor `KRAFTCLOUD_METRO` is given.
    pub default_metro: Option<Metro>,

    /// Account user name; selects the keychain entry holding the token.
    pub user: Option<String>,

    /// API base URL template (`{metro}` is substituted).
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Colored text output.
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_metro: None,
            user: None,
            api_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            color: true,
        }
    }
}

impl Settings {
    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs).max(MIN_TIMEOUT)
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Settings with their backing file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing file yields defaults; a malformed one is logged and replaced
    /// by defaults.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for callers that propagate.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        })
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in memory.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Tests
// ============================================================================
