//! File-backed hosts
//!
//! Storage lives in `<state>/storage.json` (one JSON object), installed rules
//! in `<state>/rules.json`, and seeds are read from an unpacked extension
//! directory. Good enough for scripting the router offline.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sf_core::config::FilterConfig;
use sf_core::types::{DynamicRule, RuleUpdate};
use sf_worker::{HostError, KeyValueStore, RuleApi, SeedKind, SeedSource};

async fn read_optional(path: &Path) -> Result<Option<String>, HostError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HostError::new(format!("Failed to read '{}': {}", path.display(), e))),
    }
}

async fn write_json(path: &Path, value: &Value) -> Result<(), HostError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HostError::new(format!("Failed to create '{}': {}", parent.display(), e)))?;
    }
    let text = serde_json::to_string_pretty(value).map_err(|e| HostError::new(e.to_string()))?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| HostError::new(format!("Failed to write '{}': {}", path.display(), e)))
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("storage.json"),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, HostError> {
        let Some(text) = read_optional(&self.path).await? else {
            return Ok(Map::new());
        };
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(HostError::new(format!("'{}' is not a JSON object", self.path.display()))),
            Err(e) => Err(HostError::new(format!("Failed to parse '{}': {}", self.path.display(), e))),
        }
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        let mut map = self.load().await?;
        map.insert(key.to_string(), value);
        write_json(&self.path, &Value::Object(map)).await
    }
}

pub struct FileRuleApi {
    path: PathBuf,
}

impl FileRuleApi {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("rules.json"),
        }
    }
}

impl RuleApi for FileRuleApi {
    async fn get_dynamic_rules(&self) -> Result<Vec<DynamicRule>, HostError> {
        match read_optional(&self.path).await? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| HostError::new(format!("Failed to parse '{}': {}", self.path.display(), e))),
            None => Ok(Vec::new()),
        }
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), HostError> {
        let removed: HashSet<u32> = update.remove_rule_ids.iter().copied().collect();
        let mut rules: Vec<DynamicRule> = self
            .get_dynamic_rules()
            .await?
            .into_iter()
            .filter(|rule| !removed.contains(&rule.id))
            .collect();

        for rule in update.add_rules {
            if rules.iter().any(|existing| existing.id == rule.id) {
                return Err(HostError::new(format!("Rule with id {} already exists", rule.id)));
            }
            rules.push(rule);
        }

        let value = serde_json::to_value(&rules).map_err(|e| HostError::new(e.to_string()))?;
        write_json(&self.path, &value).await
    }
}

/// Seed files under an unpacked extension directory.
pub struct FileSeeds {
    blocklist: PathBuf,
    keywords: PathBuf,
}

impl FileSeeds {
    pub fn new(extension_dir: &Path, config: &FilterConfig) -> Self {
        Self {
            blocklist: extension_dir.join(&config.seed_blocklist_path),
            keywords: extension_dir.join(&config.seed_keywords_path),
        }
    }
}

impl SeedSource for FileSeeds {
    async fn read_seed(&self, kind: SeedKind) -> Result<String, HostError> {
        let path = match kind {
            SeedKind::Blocklist => &self.blocklist,
            SeedKind::Keywords => &self.keywords,
        };
        read_optional(path)
            .await?
            .ok_or_else(|| HostError::new(format!("Seed file '{}' not found", path.display())))
    }
}
