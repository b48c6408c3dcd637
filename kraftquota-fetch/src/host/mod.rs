//! Host APIs used by the users client and the credential resolver.
//!
//! - [`keychain`] - Secure credential storage (system keychain)
//! - [`http`] - HTTP client with tracing and bearer auth

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::HttpClient;
pub use keychain::{KeychainApi, MemoryKeychain, SystemKeychain};
