//! Lookup of previously stored records by identity key.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::debug;

use roster_model::{CoercedValue, ImportResult};

use crate::identity::{composite_key, external_key};

/// Read-only view of the records already stored for an event.
pub trait IdentityIndex {
    /// Id of the stored record with this identity key, if any.
    fn lookup(&self, identity_key: &str) -> Option<String>;
}

impl<T: IdentityIndex + ?Sized> IdentityIndex for &T {
    fn lookup(&self, identity_key: &str) -> Option<String> {
        (**self).lookup(identity_key)
    }
}

/// An index with no records, for first imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyIndex;

impl IdentityIndex for EmptyIndex {
    fn lookup(&self, _identity_key: &str) -> Option<String> {
        None
    }
}

/// A stored record as exported by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Accepts `12`, `12.0` or `"12"`.
    #[serde(default)]
    pub number: Option<CoercedValue>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl ExistingRecord {
    /// Every identity key this record answers to.
    pub fn identity_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(external) = self.external_id.as_deref().filter(|v| !v.trim().is_empty()) {
            keys.push(external_key(external));
        }
        if let (Some(first), Some(last)) = (&self.first_name, &self.last_name)
            && !first.trim().is_empty()
            && !last.trim().is_empty()
        {
            let number = self.number.as_ref().map(ToString::to_string);
            keys.push(composite_key(first, last, number.as_deref()));
        }
        keys
    }
}

/// [`IdentityIndex`] over an in-memory map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryIdentityIndex {
    by_key: BTreeMap<String, String>,
}

impl InMemoryIdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes records; when two records share a key the first one wins.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ExistingRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            for key in record.identity_keys() {
                index.insert(key, record.id.clone());
            }
        }
        index
    }

    /// Adds a key unless it is already present. Returns true when added.
    pub fn insert(&mut self, identity_key: String, record_id: String) -> bool {
        match self.by_key.entry(identity_key) {
            Entry::Vacant(entry) => {
                entry.insert(record_id);
                true
            }
            Entry::Occupied(entry) => {
                debug!(record = %record_id, kept = %entry.get(), "identity key already indexed");
                false
            }
        }
    }

    /// Records every identity written by an import, as the storage layer
    /// would after applying it.
    pub fn absorb(&mut self, result: &ImportResult) {
        for row in &result.rows {
            if let (Some(identity), Some(record_id)) = (&row.identity, row.operation.record_id()) {
                self.insert(identity.identity_key().to_string(), record_id.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl IdentityIndex for InMemoryIdentityIndex {
    fn lookup(&self, identity_key: &str) -> Option<String> {
        self.by_key.get(identity_key).cloned()
    }
}
