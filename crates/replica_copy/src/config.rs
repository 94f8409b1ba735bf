//! Copy engine configuration

use serde::{Deserialize, Serialize};

use crate::error::{CopyError, Result};

/// Built-in property selection policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// Conventional accessor pairs only
    Standard,
    /// Also recognizes fluent `set_*` mutators along the ancestor chain
    NonStandard,
}

/// Engine-wide defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Selector used when a compilation does not name one
    pub default_selector: SelectorKind,

    /// Join/split delimiter of the smart converter
    pub delimiter: String,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            default_selector: SelectorKind::Standard,
            delimiter: ",".to_string(),
        }
    }
}

impl CopyConfig {
    /// Set the default selector
    pub fn with_default_selector(mut self, selector: SelectorKind) -> Self {
        self.default_selector = selector;
        self
    }

    /// Set the smart converter delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Load from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CopyConfig =
            serde_json::from_str(json).map_err(|e| CopyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(CopyError::Config("delimiter must not be empty".to_string()));
        }
        Ok(())
    }
}
