//! Filter configuration
//!
//! Defaults match the packaged extension; the CLI can override them from a
//! JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{ResourceTypes, INTERSTITIAL_PATH, MAX_DYNAMIC_RULES, RULESET_ID_BASE, RULE_PRIORITY};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings that shape generated rules and where seed data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// First dynamic rule id
    pub rule_id_base: u32,
    /// Priority of every generated rule
    pub rule_priority: u32,
    /// Extension path of the interstitial page
    pub interstitial_path: String,
    /// Resource types generated rules are scoped to
    pub resource_types: ResourceTypes,
    /// Upper bound on generated rules
    pub max_dynamic_rules: usize,
    /// Packaged seed domain list (extension-relative)
    pub seed_blocklist_path: String,
    /// Packaged seed keyword list (extension-relative)
    pub seed_keywords_path: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rule_id_base: RULESET_ID_BASE,
            rule_priority: RULE_PRIORITY,
            interstitial_path: INTERSTITIAL_PATH.to_string(),
            resource_types: ResourceTypes::MAIN_FRAME,
            max_dynamic_rules: MAX_DYNAMIC_RULES,
            seed_blocklist_path: "src/data/blocklist.json".to_string(),
            seed_keywords_path: "src/data/keywords.json".to_string(),
        }
    }
}

impl FilterConfig {
    /// Parse from JSON text; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rule_id_base == 0 {
            return Err(ConfigError::Invalid("ruleIdBase must be at least 1".to_string()));
        }
        if self.resource_types.is_empty() {
            return Err(ConfigError::Invalid("resourceTypes must not be empty".to_string()));
        }
        if !self.interstitial_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "interstitialPath must start with '/': {}",
                self.interstitial_path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.rule_id_base, 1000);
        assert_eq!(config.rule_priority, 1);
        assert_eq!(config.resource_types, ResourceTypes::MAIN_FRAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FilterConfig::from_json(r#"{ "ruleIdBase": 5000 }"#).unwrap();
        assert_eq!(config.rule_id_base, 5000);
        assert_eq!(config.interstitial_path, INTERSTITIAL_PATH);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            FilterConfig::from_json(r#"{ "resourceTypes": [] }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FilterConfig::from_json(r#"{ "ruleIdBase": "x" }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
