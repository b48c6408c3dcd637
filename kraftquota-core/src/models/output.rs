//! Output format selection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// How a report is written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned columns, one row per entry.
    Table,
    /// YAML document.
    Yaml,
    /// Pretty-printed JSON.
    Json,
    /// `key: value` lines per entry.
    #[default]
    List,
}

impl OutputFormat {
    /// All recognized formats.
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Table,
            OutputFormat::Yaml,
            OutputFormat::Json,
            OutputFormat::List,
        ]
    }

    /// Returns the flag value for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::List => "list",
        }
    }

    /// Returns true for the human-oriented formats.
    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Table | OutputFormat::List)
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CoreError::InvalidOutputFormat(s.to_string()))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `value` names a recognized output format.
pub fn is_valid_output_format(value: &str) -> bool {
    value.parse::<OutputFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        for format in OutputFormat::all() {
            assert_eq!(format.as_str().parse::<OutputFormat>().unwrap(), *format);
        }
    }

    #[test]
    fn test_default_is_list() {
        assert_eq!(OutputFormat::default(), OutputFormat::List);
    }

    #[test]
    fn test_text_formats() {
        assert!(OutputFormat::List.is_text());
        assert!(OutputFormat::Table.is_text());
        assert!(!OutputFormat::Json.is_text());
        assert!(!OutputFormat::Yaml.is_text());
    }

    #[test]
    fn test_invalid_formats() {
        for value in ["", "xml", "JSON", "tabl", " list"] {
            assert!(!is_valid_output_format(value), "{value:?} should be rejected");
        }
    }

    #[test]
    fn test_invalid_format_names_value() {
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.to_string(), "invalid output format: xml");
    }
}
