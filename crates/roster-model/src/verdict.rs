//! Duplicate verdicts attached to each row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::IdentityStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStatus {
    #[default]
    Unique,
    DuplicateInBatch,
    DuplicateExisting,
}

/// What a duplicate collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRef {
    /// Source line of the first row carrying the same identity.
    Row(usize),
    /// Id of the existing record with the same identity.
    Existing(String),
}

impl fmt::Display for ConflictRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(line) => write!(f, "row {line}"),
            Self::Existing(id) => write!(f, "existing record {id}"),
        }
    }
}

/// Policy outcome for a duplicate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Reject,
    Overwrite,
    MergeScores,
    /// Already present; nothing to write.
    Skip,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Overwrite => "overwrite",
            Self::MergeScores => "merge_scores",
            Self::Skip => "skip",
        }
    }
}

/// Which identity fields made two rows collide, rendered for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateExplanation {
    pub strategy: IdentityStrategy,
    /// Fields whose values formed the shared identity key.
    pub matched_on: Vec<String>,
    /// Disambiguating fields that were absent, e.g. `number`.
    pub missing: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    pub status: DuplicateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts_with: Option<ConflictRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<DuplicateExplanation>,
}

impl DuplicateVerdict {
    pub fn unique() -> Self {
        Self::default()
    }

    pub fn is_duplicate(&self) -> bool {
        self.status != DuplicateStatus::Unique
    }
}
