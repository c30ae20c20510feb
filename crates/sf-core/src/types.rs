//! Core type definitions for Steadfast
//!
//! The rule types mirror the browser's declarative network request shapes so
//! they can be handed to `updateDynamicRules` after a plain JSON conversion.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// First id assigned to generated dynamic rules. Lower ids belong to
/// statically packaged rule sets and are never touched.
pub const RULESET_ID_BASE: u32 = 1000;

/// Priority of every generated rule. Only one action exists, so ordering
/// beyond priority does not matter.
pub const RULE_PRIORITY: u32 = 1;

/// Browser cap on dynamic redirect rules per extension. Redirects count
/// against the smaller unsafe-rule quota, not the 30 000 general one.
pub const MAX_DYNAMIC_RULES: usize = 5_000;

/// Extension-relative path of the interstitial page.
pub const INTERSTITIAL_PATH: &str = "/src/components/safe-page/safe.html";

/// Persisted storage keys.
pub mod storage_keys {
    pub const USER_BLOCKLIST: &str = "userBlocklist";
    pub const TOTAL_BLOCKED: &str = "totalBlocked";
    pub const URL_KEYWORD_BLOCKING: &str = "urlKeywordBlocking";
    pub const USER_NOTES: &str = "userNotes";
}

// =============================================================================
// Resource Types (bit set, serialized as the browser's name list)
// =============================================================================

bitflags::bitflags! {
    /// Set of request resource types a rule applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceTypes: u16 {
        const MAIN_FRAME = 1 << 0;
        const SUB_FRAME = 1 << 1;
        const STYLESHEET = 1 << 2;
        const SCRIPT = 1 << 3;
        const IMAGE = 1 << 4;
        const FONT = 1 << 5;
        const OBJECT = 1 << 6;
        const XMLHTTPREQUEST = 1 << 7;
        const PING = 1 << 8;
        const CSP_REPORT = 1 << 9;
        const MEDIA = 1 << 10;
        const WEBSOCKET = 1 << 11;
        const OTHER = 1 << 12;

        /// Top-level and nested documents
        const DOCUMENT = Self::MAIN_FRAME.bits() | Self::SUB_FRAME.bits();
    }
}

const RESOURCE_TYPE_NAMES: &[(ResourceTypes, &str)] = &[
    (ResourceTypes::MAIN_FRAME, "main_frame"),
    (ResourceTypes::SUB_FRAME, "sub_frame"),
    (ResourceTypes::STYLESHEET, "stylesheet"),
    (ResourceTypes::SCRIPT, "script"),
    (ResourceTypes::IMAGE, "image"),
    (ResourceTypes::FONT, "font"),
    (ResourceTypes::OBJECT, "object"),
    (ResourceTypes::XMLHTTPREQUEST, "xmlhttprequest"),
    (ResourceTypes::PING, "ping"),
    (ResourceTypes::CSP_REPORT, "csp_report"),
    (ResourceTypes::MEDIA, "media"),
    (ResourceTypes::WEBSOCKET, "websocket"),
    (ResourceTypes::OTHER, "other"),
];

impl ResourceTypes {
    /// Parse a single browser resource type name (`main_frame`, not the
    /// flag name).
    pub fn from_browser_name(s: &str) -> Option<Self> {
        RESOURCE_TYPE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(flag, _)| *flag)
    }

    /// Browser names of the contained types, in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        RESOURCE_TYPE_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for ResourceTypes {
    fn default() -> Self {
        Self::MAIN_FRAME
    }
}

impl Serialize for ResourceTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ResourceTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        // Types this build does not know about are dropped rather than rejected.
        Ok(names
            .iter()
            .filter_map(|name| Self::from_browser_name(name))
            .fold(Self::empty(), |acc, flag| acc | flag))
    }
}

// =============================================================================
// Dynamic Rules
// =============================================================================

/// Declarative rule action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    Block,
    Redirect,
    Allow,
    UpgradeScheme,
    ModifyHeaders,
    AllowAllRequests,
}

/// Redirect target of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Action half of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: RuleActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

/// Condition half of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<ResourceTypes>,
}

/// A runtime-installed declarative rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicRule {
    pub id: u32,
    #[serde(default = "default_priority")]
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

fn default_priority() -> u32 {
    RULE_PRIORITY
}

impl DynamicRule {
    /// The rule's URL filter, or an empty string for regex rules.
    pub fn url_filter(&self) -> &str {
        self.condition.url_filter.as_deref().unwrap_or("")
    }

    /// Whether the rule only applies to top-level navigations.
    pub fn is_main_frame_only(&self) -> bool {
        self.condition.resource_types == Some(ResourceTypes::MAIN_FRAME)
    }
}

/// Arguments of a single `updateDynamicRules` call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default)]
    pub remove_rule_ids: Vec<u32>,
    #[serde(default)]
    pub add_rules: Vec<DynamicRule>,
}

// =============================================================================
// Block Reasons
// =============================================================================

/// Why a page ended up on the interstitial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    /// Host is on the blocklist
    Domain,
    /// URL contains a blocked keyword
    Keyword,
    /// Page content matched a keyword
    Content,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Keyword => "keyword",
            Self::Content => "content",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "domain" => Some(Self::Domain),
            "keyword" => Some(Self::Keyword),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Notes
// =============================================================================

/// A free-text note written on the interstitial page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
