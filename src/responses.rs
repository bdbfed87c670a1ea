//! Canned response catalog
//!
//! The table of scripted answers the simulator can give. It is loaded once
//! at startup (built-in or from a JSON file) and never mutated afterwards.

mod catalog;

pub use catalog::{builtin_entries, GREETING, SUGGESTED_PROMPTS};

use catalog::default_entry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Key of the catch-all entry every table must contain.
pub const DEFAULT_KEY: &str = "default";

/// A single canned answer with the citations it claims to be grounded in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub key: String,
    pub text: String,
    pub sources: Vec<String>,
}

impl ResponseEntry {
    pub fn new(
        key: impl Into<String>,
        text: impl Into<String>,
        sources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }
}

/// On-disk shape of an entry; the key is the surrounding map key.
#[derive(Debug, Deserialize)]
struct EntryBody {
    text: String,
    #[serde(default)]
    sources: Vec<String>,
}

/// Errors raised while building a response table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read response catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed response catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Response catalog has no 'default' entry")]
    MissingDefault,
    #[error("Duplicate response key: {0}")]
    DuplicateKey(String),
    #[error("Rule '{rule}' points at unknown response '{key}'")]
    UnknownResponse { rule: String, key: String },
}

/// Immutable lookup table of canned responses
#[derive(Debug, Clone)]
pub struct ResponseTable {
    entries: BTreeMap<String, ResponseEntry>,
    fallback: ResponseEntry,
}

impl ResponseTable {
    /// Build a table, enforcing unique keys and a `default` entry.
    pub fn new(entries: impl IntoIterator<Item = ResponseEntry>) -> Result<Self, TableError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.contains_key(&entry.key) {
                return Err(TableError::DuplicateKey(entry.key));
            }
            map.insert(entry.key.clone(), entry);
        }
        let fallback = map
            .get(DEFAULT_KEY)
            .cloned()
            .ok_or(TableError::MissingDefault)?;
        Ok(Self {
            entries: map,
            fallback,
        })
    }

    /// The Global News Network catalog shipped with the demo
    pub fn builtin() -> Self {
        let entries = builtin_entries()
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        Self {
            entries,
            fallback: default_entry(),
        }
    }

    /// Parse a `{ "key": { "text": ..., "sources": [...] } }` document
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let bodies: BTreeMap<String, EntryBody> = serde_json::from_str(json)?;
        Self::new(
            bodies
                .into_iter()
                .map(|(key, body)| ResponseEntry::new(key, body.text, body.sources)),
        )
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let json = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), entries = table.len(), "Loaded response catalog");
        Ok(table)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&ResponseEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up `key`, falling back to the catch-all entry.
    pub fn resolve(&self, key: &str) -> &ResponseEntry {
        self.entries.get(key).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
