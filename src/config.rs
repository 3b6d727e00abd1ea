/// Engine configuration
///
/// Everything has a sensible default, so `EngineConfig::default()` is what
/// most callers want. The CLI can also read one from a JSON file.

use crate::error::{Result, WishError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Label that makes every wish visible when it's the whole active context
pub const DEFAULT_UNIVERSAL_LABEL: &str = "universe";

/// Prefix for generated wish ids
pub const DEFAULT_ID_PREFIX: &str = "g-";

/// How the recency index answers a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyLookup {
    /// Only the entry recorded under exactly this fragment
    #[default]
    Exact,
    /// The exact entry, then every entry whose fragment extends this one
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub universal_label: String,
    pub id_prefix: String,
    /// When disabled, hand back empty values (true) or nothing at all (false)
    pub return_empty_when_disabled: bool,
    pub recency_lookup: RecencyLookup,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            universal_label: DEFAULT_UNIVERSAL_LABEL.to_string(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            return_empty_when_disabled: true,
            recency_lookup: RecencyLookup::Exact,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing keys fall back to defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.universal_label.trim().is_empty() {
            return Err(WishError::Config("universal label is empty".to_string()));
        }
        if self.universal_label.contains("{{") {
            return Err(WishError::Config(format!(
                "universal label '{}' looks like a path placeholder",
                self.universal_label
            )));
        }
        Ok(())
    }
}
