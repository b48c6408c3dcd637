// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # kraftquota Fetch
//!
//! HTTP client and host APIs for kraftquota.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::keychain`] - Secure credential storage (system keychain)
//! - [`host::http`] - HTTP client with tracing and bearer auth
//!
//! ## Users API
//!
//! - [`client::UsersClient`] - Metro-scoped users API client
//! - [`client::QuotasApi`] - Trait for remote quota retrieval
//! - [`client::UsersClientFactory`] - Builds clients from a credential and metro
//!
//! ## Example
//!
//! ```ignore
//! use kraftquota_fetch::{HttpUsersClientFactory, QuotasApi, UsersClientFactory};
//!
//! let client = HttpUsersClientFactory::new().users_client(auth.token_auth(), &metro)?;
//! let report = client.quotas().await?;
//! ```

pub mod client;
pub mod error;
pub mod host;

// Re-export key types at crate root

// Errors
pub use error::{FetchError, HttpError, KeychainError, error_chain};

// Host APIs
pub use host::{
    http::HttpClient,
    keychain::{KeychainApi, MemoryKeychain, SystemKeychain},
};

// Users API
pub use client::{DEFAULT_API_URL, HttpUsersClientFactory, QuotasApi, UsersClient, UsersClientFactory};
