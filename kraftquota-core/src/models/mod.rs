//! Domain models for kraftquota.
//!
//! ## Submodules
//!
//! - [`quota`] - Quota report types (QuotaReport, QuotaEntry, QuotaStats, QuotaLimits)
//! - [`auth`] - Credentials (AuthConfig, TokenAuth)
//! - [`metro`] - Region identifiers
//! - [`output`] - Output format selection

mod auth;
mod metro;
mod output;
mod quota;

// Re-export everything at the models level
pub use auth::{AuthConfig, TokenAuth};
pub use metro::Metro;
pub use output::{OutputFormat, is_valid_output_format};
pub use quota::{QuotaEntry, QuotaLimits, QuotaReport, QuotaStats, usage_percent};
