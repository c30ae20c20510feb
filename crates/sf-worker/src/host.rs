//! Host traits
//!
//! The browser's storage, declarative rule and packaged-file APIs. Every call
//! is a suspension point; implementations are free to be `!Send` since the
//! worker runs on a single thread.

#![allow(async_fn_in_trait)]

use serde_json::Value;
use sf_core::types::{DynamicRule, RuleUpdate};

use crate::error::HostError;

/// Persistent key-value storage (`chrome.storage.local`).
pub trait KeyValueStore {
    /// `Ok(None)` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Value>, HostError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), HostError>;
}

/// Dynamic declarative rules (`chrome.declarativeNetRequest`).
pub trait RuleApi {
    async fn get_dynamic_rules(&self) -> Result<Vec<DynamicRule>, HostError>;

    /// Apply removals and additions as one call. The host treats a single
    /// update as atomic.
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<(), HostError>;
}

/// Which packaged seed file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    Blocklist,
    Keywords,
}

/// Read-only seed files packaged with the extension.
pub trait SeedSource {
    /// Raw file contents.
    async fn read_seed(&self, kind: SeedKind) -> Result<String, HostError>;
}
