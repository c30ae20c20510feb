//! Request and response envelopes
//!
//! Requests are `{type, ...payload}` objects; every response uses the single
//! envelope `{ok, data?, error?}`. TypeScript declarations for the popup are
//! generated from these types by `ts-rs` (`sf-cli types`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_core::types::Note;
use ts_rs::TS;

use crate::error::WorkerError;

/// Every message type tag the router accepts.
pub const MESSAGE_TYPES: &[&str] = &[
    "getState",
    "addSite",
    "removeSite",
    "getUrlKeywordToggle",
    "setUrlKeywordToggle",
    "getKeywords",
    "contentBlocked",
    "getNotes",
    "addNote",
    "updateNote",
    "deleteNote",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    GetState,
    AddSite {
        #[serde(default)]
        domain: String,
    },
    RemoveSite {
        #[serde(default)]
        domain: String,
    },
    GetUrlKeywordToggle,
    SetUrlKeywordToggle {
        #[serde(default)]
        enabled: bool,
    },
    GetKeywords,
    ContentBlocked {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        keyword: Option<String>,
    },
    GetNotes,
    AddNote {
        #[serde(default)]
        text: String,
    },
    UpdateNote {
        index: usize,
        text: String,
    },
    DeleteNote {
        index: usize,
    },
}

impl Request {
    /// Parse a raw message, telling apart a missing tag, an unknown tag and a
    /// known tag with a bad payload.
    pub fn from_value(value: &Value) -> Result<Self, WorkerError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(WorkerError::InvalidMessage)?;

        if !MESSAGE_TYPES.contains(&kind) {
            return Err(WorkerError::UnknownMessageType(kind.to_string()));
        }

        serde_json::from_value(value.clone()).map_err(|e| WorkerError::MalformedMessage {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetState => "getState",
            Self::AddSite { .. } => "addSite",
            Self::RemoveSite { .. } => "removeSite",
            Self::GetUrlKeywordToggle => "getUrlKeywordToggle",
            Self::SetUrlKeywordToggle { .. } => "setUrlKeywordToggle",
            Self::GetKeywords => "getKeywords",
            Self::ContentBlocked { .. } => "contentBlocked",
            Self::GetNotes => "getNotes",
            Self::AddNote { .. } => "addNote",
            Self::UpdateNote { .. } => "updateNote",
            Self::DeleteNote { .. } => "deleteNote",
        }
    }

    /// Whether handling the request re-synchronizes rules. `getState`
    /// counts because it initializes before answering.
    pub fn resyncs_rules(&self) -> bool {
        matches!(
            self,
            Self::GetState | Self::AddSite { .. } | Self::RemoveSite { .. } | Self::SetUrlKeywordToggle { .. }
        )
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn to_value(&self) -> Value {
        // A struct of bools, strings and JSON values always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Result<Value, WorkerError>> for Response {
    fn from(result: Result<Value, WorkerError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

// =============================================================================
// Response payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StateData {
    #[ts(type = "number")]
    pub total_blocked: u64,
    /// Seed and user domains merged
    pub blocklist: Vec<String>,
    pub user_blocklist: Vec<String>,
    pub url_keyword_blocking: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SiteAdded {
    pub added: String,
    pub user_blocklist: Vec<String>,
    pub blocklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SiteRemoved {
    pub removed: String,
    pub user_blocklist: Vec<String>,
    pub blocklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ToggleData {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct KeywordsData {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BlockedData {
    #[ts(type = "number")]
    pub total_blocked: u64,
    /// Interstitial URL (extension-relative) describing the block
    pub redirect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct NotesData {
    #[ts(type = "Array<{ text: string, timestamp: string }>")]
    pub notes: Vec<Note>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_requests() {
        assert_eq!(Request::from_value(&json!({"type": "getState"})).unwrap(), Request::GetState);
        assert_eq!(
            Request::from_value(&json!({"type": "addSite", "domain": "a.com"})).unwrap(),
            Request::AddSite { domain: "a.com".to_string() }
        );
        assert_eq!(
            Request::from_value(&json!({"type": "setUrlKeywordToggle"})).unwrap(),
            Request::SetUrlKeywordToggle { enabled: false }
        );
        assert_eq!(
            Request::from_value(&json!({"type": "contentBlocked", "url": "https://x.com"})).unwrap(),
            Request::ContentBlocked {
                url: Some("https://x.com".to_string()),
                keyword: None
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Request::from_value(&json!(null)), Err(WorkerError::InvalidMessage)));
        assert!(matches!(Request::from_value(&json!({"type": 3})), Err(WorkerError::InvalidMessage)));
        assert!(matches!(
            Request::from_value(&json!({"type": "launchRockets"})),
            Err(WorkerError::UnknownMessageType(t)) if t == "launchRockets"
        ));
        assert!(matches!(
            Request::from_value(&json!({"type": "deleteNote"})),
            Err(WorkerError::MalformedMessage { .. })
        ));
        assert!(matches!(
            Request::from_value(&json!({"type": "setUrlKeywordToggle", "enabled": "yes"})),
            Err(WorkerError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_every_tag_is_listed() {
        let requests = [
            Request::GetState,
            Request::AddSite { domain: String::new() },
            Request::RemoveSite { domain: String::new() },
            Request::GetUrlKeywordToggle,
            Request::SetUrlKeywordToggle { enabled: true },
            Request::GetKeywords,
            Request::ContentBlocked { url: None, keyword: None },
            Request::GetNotes,
            Request::AddNote { text: String::new() },
            Request::UpdateNote { index: 0, text: String::new() },
            Request::DeleteNote { index: 0 },
        ];
        assert_eq!(requests.len(), MESSAGE_TYPES.len());
        for request in requests {
            assert!(MESSAGE_TYPES.contains(&request.kind()));
            let value = serde_json::to_value(&request).unwrap();
            assert_eq!(value["type"], request.kind());
        }
    }

    #[test]
    fn test_typescript_declarations() {
        let response = Response::decl();
        assert!(response.contains("ok: boolean"));
        assert!(response.contains("error?: string"));
        assert!(StateData::decl().contains("totalBlocked: number"));
    }

    #[test]
    fn test_envelope_shape() {
        assert_eq!(Response::success(json!({"a": 1})).to_value(), json!({"ok": true, "data": {"a": 1}}));
        assert_eq!(Response::failure("nope").to_value(), json!({"ok": false, "error": "nope"}));
    }
}
