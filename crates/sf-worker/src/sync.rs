//! Dynamic rule synchronization
//!
//! Every sync removes all installed dynamic rules and installs a freshly
//! built set in a single update call. Rule counts are small, so no diffing
//! is attempted.

use sf_compiler::build_rules;
use sf_core::config::FilterConfig;
use sf_core::types::RuleUpdate;

use crate::error::WorkerError;
use crate::host::RuleApi;

/// Outcome of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub removed: usize,
    pub added: usize,
    pub domain_rules: usize,
    pub keyword_rules: usize,
}

pub struct RuleSynchronizer<R> {
    api: R,
    config: FilterConfig,
}

impl<R: RuleApi> RuleSynchronizer<R> {
    pub fn new(api: R, config: FilterConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &R {
        &self.api
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace the installed rules with rules for `domains` and `keywords`.
    ///
    /// Rules are built before anything is touched, so a build error leaves
    /// the installed set as it was. Host errors propagate unchanged.
    pub async fn sync(&self, domains: &[String], keywords: &[String]) -> Result<SyncReport, WorkerError> {
        let rule_set = build_rules(domains, keywords, &self.config)?;

        let existing = self
            .api
            .get_dynamic_rules()
            .await
            .map_err(WorkerError::RuleApi)?;
        let remove_rule_ids: Vec<u32> = existing.iter().map(|rule| rule.id).collect();

        let report = SyncReport {
            removed: remove_rule_ids.len(),
            added: rule_set.len(),
            domain_rules: rule_set.domain_rules,
            keyword_rules: rule_set.keyword_rules,
        };

        self.api
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids,
                add_rules: rule_set.rules,
            })
            .await
            .map_err(WorkerError::RuleApi)?;

        log::debug!(
            "Synced dynamic rules: removed {}, added {} ({} domain, {} keyword)",
            report.removed,
            report.added,
            report.domain_rules,
            report.keyword_rules
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRuleApi;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_sync_replaces_everything() {
        let sync = RuleSynchronizer::new(MemoryRuleApi::new(), FilterConfig::default());

        let first = sync.sync(&strings(&["a.com", "b.com"]), &strings(&["casino"])).await.unwrap();
        assert_eq!(first, SyncReport { removed: 0, added: 3, domain_rules: 2, keyword_rules: 1 });

        let second = sync.sync(&strings(&["c.com"]), &[]).await.unwrap();
        assert_eq!(second.removed, 3);
        assert_eq!(second.added, 1);

        let rules = sync.api().rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, 1000);
        assert_eq!(rules[0].url_filter(), "||c.com^");
        assert!(rules[0].is_main_frame_only());
    }

    #[tokio::test]
    async fn test_sync_is_deterministic() {
        let sync = RuleSynchronizer::new(MemoryRuleApi::new(), FilterConfig::default());
        let domains = strings(&["a.com", "b.com"]);

        sync.sync(&domains, &[]).await.unwrap();
        let first = sync.api().rules();
        sync.sync(&domains, &[]).await.unwrap();
        assert_eq!(sync.api().rules(), first);
    }

    #[tokio::test]
    async fn test_sync_error_propagates() {
        let sync = RuleSynchronizer::new(MemoryRuleApi::new(), FilterConfig::default());
        sync.sync(&strings(&["a.com"]), &[]).await.unwrap();

        sync.api().set_fail_updates(true);
        let err = sync.sync(&strings(&["b.com"]), &[]).await.unwrap_err();
        assert!(matches!(err, WorkerError::RuleApi(_)));
        assert_eq!(sync.api().rules()[0].url_filter(), "||a.com^");
    }

    #[tokio::test]
    async fn test_build_error_leaves_rules_untouched() {
        let config = FilterConfig {
            max_dynamic_rules: 1,
            ..FilterConfig::default()
        };
        let sync = RuleSynchronizer::new(MemoryRuleApi::new(), config);
        sync.sync(&strings(&["a.com"]), &[]).await.unwrap();

        let err = sync.sync(&strings(&["a.com", "b.com"]), &[]).await.unwrap_err();
        assert!(matches!(err, WorkerError::Build(_)));
        assert_eq!(sync.api().rules().len(), 1);
        assert_eq!(sync.api().update_count(), 1);
    }
}
