//! In-memory hosts
//!
//! Used by tests and by embedders that want to drive the router without a
//! browser. The rule host enforces the same id uniqueness the browser does.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use serde_json::Value;
use sf_core::types::{DynamicRule, RuleUpdate};

use crate::error::HostError;
use crate::host::{KeyValueStore, RuleApi, SeedKind, SeedSource};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: Value) -> Self {
        self.values.borrow_mut().insert(key.to_string(), value);
        self
    }

    /// Current raw value of a key.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    /// Make every subsequent `set` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError> {
        if self.fail_writes.get() {
            return Err(HostError::new(format!("write to '{}' rejected", key)));
        }
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRuleApi {
    rules: RefCell<Vec<DynamicRule>>,
    updates: Cell<usize>,
    fail_updates: Cell<bool>,
}

impl MemoryRuleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with rules already installed, as after a worker restart.
    pub fn with_rules(rules: Vec<DynamicRule>) -> Self {
        Self {
            rules: RefCell::new(rules),
            ..Self::default()
        }
    }

    pub fn rules(&self) -> Vec<DynamicRule> {
        self.rules.borrow().clone()
    }

    /// Number of successful `update_dynamic_rules` calls.
    pub fn update_count(&self) -> usize {
        self.updates.get()
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.set(fail);
    }
}

impl RuleApi for MemoryRuleApi {
    async fn get_dynamic_rules(&self) -> Result<Vec<DynamicRule>, HostError> {
        Ok(self.rules())
    }

    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), HostError> {
        if self.fail_updates.get() {
            return Err(HostError::new("rule update rejected"));
        }

        let remove: HashSet<u32> = update.remove_rule_ids.iter().copied().collect();
        let mut next: Vec<DynamicRule> = self
            .rules
            .borrow()
            .iter()
            .filter(|rule| !remove.contains(&rule.id))
            .cloned()
            .collect();

        let mut ids: HashSet<u32> = next.iter().map(|rule| rule.id).collect();
        for rule in &update.add_rules {
            if !ids.insert(rule.id) {
                // Nothing is applied when any rule is rejected.
                return Err(HostError::new(format!("Rule with id {} already exists", rule.id)));
            }
        }

        next.extend(update.add_rules);
        *self.rules.borrow_mut() = next;
        self.updates.set(self.updates.get() + 1);
        Ok(())
    }
}

/// Seed files held in memory; `None` behaves like a missing file.
#[derive(Debug, Default, Clone)]
pub struct StaticSeeds {
    pub blocklist: Option<String>,
    pub keywords: Option<String>,
}

impl StaticSeeds {
    pub fn new(blocklist: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            blocklist: Some(blocklist.into()),
            keywords: Some(keywords.into()),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }
}

impl SeedSource for StaticSeeds {
    async fn read_seed(&self, kind: SeedKind) -> Result<String, HostError> {
        let text = match kind {
            SeedKind::Blocklist => &self.blocklist,
            SeedKind::Keywords => &self.keywords,
        };
        text.clone()
            .ok_or_else(|| HostError::new(format!("Failed to load {:?} seed: 404", kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::types::{RuleAction, RuleActionType, RuleCondition};

    fn rule(id: u32) -> DynamicRule {
        DynamicRule {
            id,
            priority: 1,
            action: RuleAction {
                action_type: RuleActionType::Block,
                redirect: None,
            },
            condition: RuleCondition::default(),
        }
    }

    #[tokio::test]
    async fn test_rule_update_replaces() {
        let api = MemoryRuleApi::with_rules(vec![rule(1000), rule(1001)]);
        api.update_dynamic_rules(RuleUpdate {
            remove_rule_ids: vec![1000, 1001],
            add_rules: vec![rule(1000)],
        })
        .await
        .unwrap();

        assert_eq!(api.rules(), vec![rule(1000)]);
        assert_eq!(api.update_count(), 1);
    }

    #[tokio::test]
    async fn test_rule_update_duplicate_id_is_atomic() {
        let api = MemoryRuleApi::with_rules(vec![rule(5)]);
        let result = api
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids: vec![],
                add_rules: vec![rule(6), rule(5)],
            })
            .await;

        assert!(result.is_err());
        assert_eq!(api.rules(), vec![rule(5)]);
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn test_store_fail_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.set("k", Value::Bool(true)).await.is_err());
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
