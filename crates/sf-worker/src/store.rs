//! Typed access to persisted values
//!
//! Reads never trust storage: lists are re-normalized, deduplicated and
//! sorted, and values of the wrong type read as their defaults. Writes are
//! plain overwrites, so two overlapping read-modify-write sequences resolve
//! to whichever wrote last.

use serde_json::Value;
use sf_compiler::dedupe_sorted;
use sf_core::normalize::normalize_domain;
use sf_core::types::{storage_keys, Note};

use crate::error::WorkerError;
use crate::host::KeyValueStore;

pub struct Store<S> {
    kv: S,
}

impl<S: KeyValueStore> Store<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &S {
        &self.kv
    }

    async fn read(&self, key: &str) -> Result<Option<Value>, WorkerError> {
        self.kv.get(key).await.map_err(WorkerError::Storage)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), WorkerError> {
        self.kv.set(key, value).await.map_err(WorkerError::Storage)
    }

    // =========================================================================
    // User blocklist
    // =========================================================================

    pub async fn user_blocklist(&self) -> Result<Vec<String>, WorkerError> {
        let items = match self.read(storage_keys::USER_BLOCKLIST).await? {
            Some(Value::Array(items)) => items,
            Some(other) => {
                log::warn!("Stored user blocklist is not a list ({}); ignoring it", type_name(&other));
                return Ok(Vec::new());
            }
            None => return Ok(Vec::new()),
        };

        let total = items.len();
        let domains: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_domain)
            .collect();
        if domains.len() < total {
            log::warn!("Dropped {} malformed user blocklist entries", total - domains.len());
        }

        Ok(dedupe_sorted(domains))
    }

    /// Normalize, deduplicate, sort and persist. Returns what was stored.
    pub async fn set_user_blocklist<I>(&self, domains: I) -> Result<Vec<String>, WorkerError>
    where
        I: IntoIterator<Item = String>,
    {
        let normalized = dedupe_sorted(domains.into_iter().filter_map(|d| normalize_domain(&d)));
        self.write(storage_keys::USER_BLOCKLIST, serde_json::to_value(&normalized)?)
            .await?;
        Ok(normalized)
    }

    // =========================================================================
    // Block counter
    // =========================================================================

    /// Current counter. Writes 0 first if the counter is absent or not a
    /// non-negative integer.
    pub async fn total_blocked(&self) -> Result<u64, WorkerError> {
        match self.read(storage_keys::TOTAL_BLOCKED).await?.as_ref().and_then(Value::as_u64) {
            Some(count) => Ok(count),
            None => {
                self.write(storage_keys::TOTAL_BLOCKED, Value::from(0u64)).await?;
                Ok(0)
            }
        }
    }

    pub async fn increment_total_blocked(&self) -> Result<u64, WorkerError> {
        let next = self.total_blocked().await?.saturating_add(1);
        self.write(storage_keys::TOTAL_BLOCKED, Value::from(next)).await?;
        Ok(next)
    }

    // =========================================================================
    // Keyword toggle
    // =========================================================================

    /// Off unless the stored value is exactly `true`.
    pub async fn url_keyword_blocking(&self) -> Result<bool, WorkerError> {
        Ok(matches!(
            self.read(storage_keys::URL_KEYWORD_BLOCKING).await?,
            Some(Value::Bool(true))
        ))
    }

    pub async fn set_url_keyword_blocking(&self, enabled: bool) -> Result<bool, WorkerError> {
        self.write(storage_keys::URL_KEYWORD_BLOCKING, Value::Bool(enabled))
            .await?;
        Ok(enabled)
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// Stored notes in insertion order; entries that do not parse are skipped.
    pub async fn notes(&self) -> Result<Vec<Note>, WorkerError> {
        let items = match self.read(storage_keys::USER_NOTES).await? {
            Some(Value::Array(items)) => items,
            _ => return Ok(Vec::new()),
        };

        let total = items.len();
        let notes: Vec<Note> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if notes.len() < total {
            log::warn!("Dropped {} malformed notes", total - notes.len());
        }

        Ok(notes)
    }

    pub async fn set_notes(&self, notes: &[Note]) -> Result<(), WorkerError> {
        self.write(storage_keys::USER_NOTES, serde_json::to_value(notes)?)
            .await
    }

    pub async fn add_note(&self, text: &str) -> Result<Vec<Note>, WorkerError> {
        let mut notes = self.notes().await?;
        notes.push(Note::new(text));
        self.set_notes(&notes).await?;
        Ok(notes)
    }

    /// Replace the text of the note at `index`, keeping its timestamp.
    pub async fn update_note(&self, index: usize, text: &str) -> Result<Vec<Note>, WorkerError> {
        let mut notes = self.notes().await?;
        let note = notes.get_mut(index).ok_or(WorkerError::NoteNotFound(index))?;
        note.text = text.to_string();
        self.set_notes(&notes).await?;
        Ok(notes)
    }

    pub async fn delete_note(&self, index: usize) -> Result<Vec<Note>, WorkerError> {
        let mut notes = self.notes().await?;
        if index >= notes.len() {
            return Err(WorkerError::NoteNotFound(index));
        }
        notes.remove(index);
        self.set_notes(&notes).await?;
        Ok(notes)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
