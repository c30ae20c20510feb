//! Declarative rule builder
//!
//! Every domain becomes a hostname-anchored rule and every keyword a
//! substring rule. Ids are assigned sequentially from the configured base,
//! domains first, in input order, so the same input always yields the same
//! rule set.

use sf_core::config::FilterConfig;
use sf_core::interstitial::{interstitial_url, InterstitialParams};
use sf_core::types::{BlockReason, DynamicRule, Redirect, RuleAction, RuleActionType, RuleCondition};

/// Error type for rule building.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Too many rules: {count} exceeds the dynamic rule limit of {limit}")]
    TooManyRules { count: usize, limit: usize },
    #[error("Rule id overflow: base {base} with {count} rules")]
    IdOverflow { base: u32, count: usize },
}

/// Generated rules plus a breakdown by source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<DynamicRule>,
    pub domain_rules: usize,
    pub keyword_rules: usize,
}

impl RuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Match pattern for an exact host (and its subdomains).
pub fn domain_url_filter(domain: &str) -> String {
    format!("||{}^", domain)
}

/// Match pattern for a URL substring.
pub fn keyword_url_filter(keyword: &str) -> String {
    format!("*{}*", keyword)
}

pub fn build_rules(domains: &[String], keywords: &[String], config: &FilterConfig) -> Result<RuleSet, BuildError> {
    let count = domains.len() + keywords.len();
    if count > config.max_dynamic_rules {
        return Err(BuildError::TooManyRules {
            count,
            limit: config.max_dynamic_rules,
        });
    }

    let overflow = || BuildError::IdOverflow {
        base: config.rule_id_base,
        count,
    };
    let count_u32 = u32::try_from(count).map_err(|_| overflow())?;
    config.rule_id_base.checked_add(count_u32).ok_or_else(overflow)?;

    let mut rules = Vec::with_capacity(count);
    let mut id = config.rule_id_base;

    for domain in domains {
        let target = InterstitialParams::new(BlockReason::Domain);
        rules.push(make_rule(id, domain_url_filter(domain), &target, config));
        id += 1;
    }

    for keyword in keywords {
        let target = InterstitialParams::new(BlockReason::Keyword).with_keyword(keyword.as_str());
        rules.push(make_rule(id, keyword_url_filter(keyword), &target, config));
        id += 1;
    }

    log::debug!(
        "Built {} rules ({} domain, {} keyword) from id {}",
        rules.len(),
        domains.len(),
        keywords.len(),
        config.rule_id_base
    );

    Ok(RuleSet {
        rules,
        domain_rules: domains.len(),
        keyword_rules: keywords.len(),
    })
}

fn make_rule(id: u32, url_filter: String, target: &InterstitialParams, config: &FilterConfig) -> DynamicRule {
    DynamicRule {
        id,
        priority: config.rule_priority,
        action: RuleAction {
            action_type: RuleActionType::Redirect,
            redirect: Some(Redirect {
                extension_path: Some(interstitial_url(&config.interstitial_path, target)),
                url: None,
            }),
        },
        condition: RuleCondition {
            url_filter: Some(url_filter),
            regex_filter: None,
            resource_types: Some(config.resource_types),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::types::ResourceTypes;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_rules_ids_and_patterns() {
        let config = FilterConfig::default();
        let set = build_rules(&strings(&["a.com", "b.org"]), &strings(&["casino"]), &config).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.domain_rules, 2);
        assert_eq!(set.keyword_rules, 1);

        let ids: Vec<u32> = set.rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1000, 1001, 1002]);

        let filters: Vec<&str> = set.rules.iter().map(|r| r.url_filter()).collect();
        assert_eq!(filters, vec!["||a.com^", "||b.org^", "*casino*"]);

        for rule in &set.rules {
            assert_eq!(rule.priority, 1);
            assert_eq!(rule.action.action_type, RuleActionType::Redirect);
            assert_eq!(rule.condition.resource_types, Some(ResourceTypes::MAIN_FRAME));
        }
    }

    #[test]
    fn test_redirect_targets_carry_reason() {
        let config = FilterConfig::default();
        let set = build_rules(&strings(&["a.com"]), &strings(&["bad word"]), &config).unwrap();

        let path = |rule: &DynamicRule| rule.action.redirect.clone().unwrap().extension_path.unwrap();
        assert_eq!(path(&set.rules[0]), "/src/components/safe-page/safe.html?reason=domain");
        assert_eq!(
            path(&set.rules[1]),
            "/src/components/safe-page/safe.html?reason=keyword&keyword=bad+word"
        );
    }

    #[test]
    fn test_build_rules_deterministic() {
        let config = FilterConfig::default();
        let domains = strings(&["x.com", "y.com"]);
        let first = build_rules(&domains, &[], &config).unwrap();
        let second = build_rules(&domains, &[], &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_rules_limit() {
        let config = FilterConfig {
            max_dynamic_rules: 2,
            ..FilterConfig::default()
        };
        let err = build_rules(&strings(&["a.com", "b.com"]), &strings(&["c"]), &config).unwrap_err();
        assert!(matches!(err, BuildError::TooManyRules { count: 3, limit: 2 }));
    }

    #[test]
    fn test_default_limit_is_redirect_quota() {
        let config = FilterConfig::default();
        let domains: Vec<String> = (0..5001).map(|i| format!("site{}.com", i)).collect();

        let err = build_rules(&domains, &[], &config).unwrap_err();
        assert!(matches!(err, BuildError::TooManyRules { count: 5001, limit: 5000 }));

        let set = build_rules(&domains[..5000], &[], &config).unwrap();
        assert_eq!(set.len(), 5000);
    }

    #[test]
    fn test_build_rules_id_overflow() {
        let config = FilterConfig {
            rule_id_base: u32::MAX - 1,
            ..FilterConfig::default()
        };
        let err = build_rules(&strings(&["a.com", "b.com"]), &[], &config).unwrap_err();
        assert!(matches!(err, BuildError::IdOverflow { .. }));
    }

    #[test]
    fn test_build_rules_empty() {
        let set = build_rules(&[], &[], &FilterConfig::default()).unwrap();
        assert!(set.is_empty());
    }
}
