// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # kraftquota Store
//!
//! Settings and credential resolution for kraftquota.
//!
//! This crate provides:
//!
//! - **SettingsStore**: User preferences with persistence
//! - **ConfigResolver**: Metro/token population and auth-config resolution
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use kraftquota_store::{ConfigResolver, EnvConfigResolver, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await?.get().await;
//! let resolver = EnvConfigResolver::new(settings, keychain).with_flags(metro, token);
//!
//! let resolved = resolver.populate_metro_token()?;
//! let auth = resolver.auth_config(resolved.token.as_deref()).await?;
//! ```

pub mod error;
pub mod persistence;
pub mod resolver;
pub mod settings_store;

pub use error::StoreError;
pub use persistence::{default_config_dir, default_settings_path, ensure_dir, load_json, save_json};
pub use resolver::{
    ConfigResolver, EnvConfigResolver, EnvSource, METRO_ENV, MetroToken, ProcessEnv, TOKEN_ENV,
    clear_token, store_token,
};
pub use settings_store::{Settings, SettingsStore};
