//! Metro (region) identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// A regional endpoint identifier, e.g. `fra0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Metro(String);

impl Metro {
    /// Parses and normalizes a metro name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidMetro` if the name is empty or contains
    /// anything other than ASCII letters and digits.
    pub fn new(name: &str) -> Result<Self, CoreError> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(CoreError::InvalidMetro("metro is empty".to_string()));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidMetro(name));
        }
        Ok(Self(name))
    }

    /// Returns the metro name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Metro {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Metro {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Metro> for String {
    fn from(metro: Metro) -> Self {
        metro.0
    }
}

impl std::fmt::Display for Metro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
