//! JSON and YAML output formatting.

use kraftquota_core::{AuthConfig, QuotaEntry, QuotaLimits, QuotaReport, QuotaStats};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Full quota entry as printed.
#[derive(Debug, Serialize)]
pub struct QuotaOutput<'a> {
    pub uuid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
    pub used: &'a QuotaStats,
    pub hard: &'a QuotaStats,
    pub limits: &'a QuotaLimits,
    pub features: &'a [String],
}

/// Limits-only view of an entry.
#[derive(Debug, Serialize)]
pub struct LimitsOutput<'a> {
    pub uuid: &'a str,
    pub limits: &'a QuotaLimits,
}

/// Features-only view of an entry.
#[derive(Debug, Serialize)]
pub struct FeaturesOutput<'a> {
    pub uuid: &'a str,
    pub features: &'a [String],
}

/// A single entry prints as an object, several as an array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn from_vec(mut items: Vec<T>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return Self::One(item);
            }
        }
        Self::Many(items)
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Builds the full output for every entry of a report.
pub fn quota_outputs<'a>(auth: &'a AuthConfig, report: &'a QuotaReport) -> OneOrMany<QuotaOutput<'a>> {
    OneOrMany::from_vec(
        report
            .quotas
            .iter()
            .map(|entry| QuotaOutput {
                uuid: &entry.uuid,
                user: auth.user.as_deref(),
                used: &entry.used,
                hard: &entry.hard,
                limits: &entry.limits,
                features: &entry.features,
            })
            .collect(),
    )
}

/// Builds the limits output for every entry of a report.
pub fn limits_outputs(report: &QuotaReport) -> OneOrMany<LimitsOutput<'_>> {
    OneOrMany::from_vec(
        report
            .quotas
            .iter()
            .map(|entry: &QuotaEntry| LimitsOutput {
                uuid: &entry.uuid,
                limits: &entry.limits,
            })
            .collect(),
    )
}

/// Builds the features output for every entry of a report.
pub fn features_outputs(report: &QuotaReport) -> OneOrMany<FeaturesOutput<'_>> {
    OneOrMany::from_vec(
        report
            .quotas
            .iter()
            .map(|entry: &QuotaEntry| FeaturesOutput {
                uuid: &entry.uuid,
                features: &entry.features,
            })
            .collect(),
    )
}

// ============================================================================
// Formatters
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serializes a value.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// YAML formatter.
pub struct YamlFormatter;

impl YamlFormatter {
    /// Serializes a value, without the trailing newline.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(value)?;
        Ok(yaml.trim_end().to_string())
    }
}
