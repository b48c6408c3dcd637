// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `kraftquota` Core
//!
//! Core types and models for the `kraftquota` CLI.
//!
//! This crate provides the foundational types shared by the fetch, store and
//! CLI crates:
//!
//! - Domain models (quota report, credentials, metros, output formats)
//! - Error types
//!
//! ## Key Types
//!
//! ### Quota Types
//! - [`QuotaReport`] - All quota entries returned for the account
//! - [`QuotaEntry`] - Usage, hard caps, limits, and features of one user
//! - [`QuotaStats`] - Resource counters
//! - [`QuotaLimits`] - Per-resource size limits
//!
//! ### Configuration Types
//! - [`AuthConfig`] - Resolved user and secret
//! - [`TokenAuth`] - Bearer credential for the API
//! - [`Metro`] - Region identifier
//! - [`OutputFormat`] - `table`, `yaml`, `json` or `list`

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Quota types
    QuotaEntry,
    QuotaLimits,
    QuotaReport,
    QuotaStats,
    usage_percent,
    // Configuration types
    AuthConfig,
    Metro,
    OutputFormat,
    TokenAuth,
    is_valid_output_format,
};
