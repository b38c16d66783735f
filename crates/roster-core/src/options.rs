//! Import configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use roster_map::ConfidenceThresholds;
use roster_model::{ConfidenceLevel, ImportIntent};

use crate::duplicates::{BatchDuplicatePolicy, DuplicatePolicy, RosterDuplicatePolicy};
use crate::error::{ImportError, Result};
use crate::identity::IdentityKeys;

/// Default cap on data rows per import.
pub const DEFAULT_MAX_ROWS: usize = 5000;

/// Settings for one import run.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```toml
/// event_id = "spring-combine"
/// batch_duplicates = "merge_scores"
///
/// [thresholds]
/// high = 95
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Event the import targets; seeds stable record ids.
    pub event_id: String,
    pub identity_keys: IdentityKeys,
    /// Automatic mappings below this tier are ignored.
    pub min_confidence: ConfidenceLevel,
    pub thresholds: ConfidenceThresholds,
    /// Allow several columns to feed one field.
    pub allow_shared_targets: bool,
    pub batch_duplicates: BatchDuplicatePolicy,
    /// Only consulted by roster-only imports.
    pub roster_duplicates: RosterDuplicatePolicy,
    pub max_rows: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            event_id: "default".to_string(),
            identity_keys: IdentityKeys::default(),
            min_confidence: ConfidenceLevel::Low,
            thresholds: ConfidenceThresholds::default(),
            allow_shared_targets: false,
            batch_duplicates: BatchDuplicatePolicy::default(),
            roster_duplicates: RosterDuplicatePolicy::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl ImportOptions {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_batch_duplicates(mut self, policy: BatchDuplicatePolicy) -> Self {
        self.batch_duplicates = policy;
        self
    }

    #[must_use]
    pub fn with_roster_duplicates(mut self, policy: RosterDuplicatePolicy) -> Self {
        self.roster_duplicates = policy;
        self
    }

    #[must_use]
    pub fn with_allow_shared_targets(mut self, allow: bool) -> Self {
        self.allow_shared_targets = allow;
        self
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn duplicate_policy(&self, intent: ImportIntent) -> DuplicatePolicy {
        DuplicatePolicy::for_intent(intent, self.batch_duplicates, self.roster_duplicates)
    }

    /// Parses options from TOML. `path` is only used in error messages.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| ImportError::Options {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }
}
