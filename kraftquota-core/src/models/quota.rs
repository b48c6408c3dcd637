//! Quota-related types.
//!
//! This module contains the account quota report returned by the users API:
//! - [`QuotaReport`] - All quota entries for the authenticated account
//! - [`QuotaEntry`] - Usage, hard caps, limits, and features of one user
//! - [`QuotaStats`] - Resource counters (used or hard)
//! - [`QuotaLimits`] - Per-resource size limits

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Quota Report
// ============================================================================

/// Quota report for the authenticated account.
///
/// The API nests the entries under `data.quotas`; the envelope is stripped by
/// the client, so this only carries the entries themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaReport {
    /// Quota entries (one per user the token can see).
    #[serde(default)]
    pub quotas: Vec<QuotaEntry>,
}

impl QuotaReport {
    /// Creates a report from entries.
    pub fn new(quotas: Vec<QuotaEntry>) -> Self {
        Self { quotas }
    }

    /// Returns true if the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }

    /// Returns the first entry flagged as an error by the API, if any.
    pub fn first_error(&self) -> Option<&QuotaEntry> {
        self.quotas.iter().find(|q| q.is_error())
    }

    /// Returns the entries, or an error if any of them carries an API error.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` with the entry's message if an entry
    /// has `status == "error"`.
    pub fn all_or_err(&self) -> Result<&[QuotaEntry], CoreError> {
        match self.first_error() {
            Some(entry) => Err(CoreError::InvalidData(
                entry
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("quota entry {} reported an error", entry.uuid)),
            )),
            None => Ok(&self.quotas),
        }
    }
}

/// Quota entry for a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEntry {
    /// Per-entry status (`success` or `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// User UUID.
    #[serde(default)]
    pub uuid: String,

    /// Error or informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Currently consumed resources.
    #[serde(default)]
    pub used: QuotaStats,

    /// Hard caps on the same resources.
    #[serde(default)]
    pub hard: QuotaStats,

    /// Size limits for individual resources.
    #[serde(default)]
    pub limits: QuotaLimits,

    /// Names of features enabled for this account.
    #[serde(default)]
    pub features: Vec<String>,
}

impl QuotaEntry {
    /// Returns true if the API flagged this entry as an error.
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    /// Returns true if the named feature is enabled.
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }
}

// ============================================================================
// Stats & Limits
// ============================================================================

/// Resource counters, used both for consumption and for hard caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaStats {
    /// Instances (any state).
    pub instances: u64,
    /// Running instances.
    pub live_instances: u64,
    /// Memory of running instances in MiB.
    pub live_memory_mb: u64,
    /// Service groups.
    pub service_groups: u64,
    /// Published services.
    pub services: u64,
    /// Volumes.
    pub volumes: u64,
    /// Total volume storage in MiB.
    pub total_volume_mb: u64,
}

/// Size limits for individual resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaLimits {
    /// Smallest instance memory in MiB.
    pub min_memory_mb: u64,
    /// Largest instance memory in MiB.
    pub max_memory_mb: u64,
    /// Smallest volume in MiB.
    pub min_volume_mb: u64,
    /// Largest volume in MiB.
    pub max_volume_mb: u64,
    /// Smallest autoscale group.
    pub min_autoscale_size: u64,
    /// Largest autoscale group.
    pub max_autoscale_size: u64,
}

/// Percentage of `hard` consumed by `used`, or `None` when there is no cap.
pub fn usage_percent(used: u64, hard: u64) -> Option<f64> {
    if hard == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    Some((used as f64 / hard as f64) * 100.0)
}

// ============================================================================
// Tests
// ============================================================================
