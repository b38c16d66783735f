//! Import output: per-row outcomes plus aggregate counts and diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::RowIdentity;
use crate::intent::ImportIntent;
use crate::issue::{ImportIssue, IssueSeverity};
use crate::mapping::ColumnMapping;
use crate::sheet::CoercedValue;
use crate::verdict::DuplicateVerdict;

/// Terminal operation a row resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RowOperation {
    Create { record_id: String },
    Update { record_id: String },
    MergeScores { record_id: String },
    /// Already present and nothing to write.
    Skip { record_id: String },
    /// Scores folded into an earlier row of the same batch.
    MergedIntoRow { row: usize },
    Reject,
}

impl RowOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::MergeScores { .. } => "merge_scores",
            Self::Skip { .. } => "skip",
            Self::MergedIntoRow { .. } => "merged_into_row",
            Self::Reject => "reject",
        }
    }

    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Create { record_id }
            | Self::Update { record_id }
            | Self::MergeScores { record_id }
            | Self::Skip { record_id } => Some(record_id),
            Self::MergedIntoRow { .. } | Self::Reject => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

/// Payload for the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordWrite {
    pub record_id: String,
    /// Roster attributes to set. `None` means identity fields must not be touched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<BTreeMap<String, CoercedValue>>,
    /// Drill key to score, merged into any scores already stored.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    /// 1-based source line.
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<RowIdentity>,
    pub verdict: DuplicateVerdict,
    pub operation: RowOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<RecordWrite>,
    #[serde(default)]
    pub issues: Vec<ImportIssue>,
}

impl RowOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &ImportIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity != IssueSeverity::Warning)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ImportIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub merged: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub unmapped_columns: usize,
    pub unmapped_fields: usize,
}

/// Per-drill score counts, used to spot mappings that wrote nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDiagnostics {
    /// Every schema drill, including those with zero scores.
    pub by_field: BTreeMap<String, usize>,
    pub total: usize,
    /// Drill keys that had a mapped column.
    pub mapped_drills: Vec<String>,
    /// Mapped drills that received no score at all.
    pub drills_without_scores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub event_id: String,
    pub intent: ImportIntent,
    pub mapping: Vec<ColumnMapping>,
    pub unmapped_columns: Vec<String>,
    pub unmapped_fields: Vec<String>,
    pub rows: Vec<RowOutcome>,
    pub counts: ImportCounts,
    pub scores: ScoreDiagnostics,
    /// Non-blocking issues about the mapping or the batch as a whole.
    #[serde(default)]
    pub mapping_issues: Vec<ImportIssue>,
}

impl ImportResult {
    /// Writes the storage layer should apply, in row order.
    pub fn writes(&self) -> impl Iterator<Item = &RecordWrite> {
        self.rows.iter().filter_map(|row| row.write.as_ref())
    }

    pub fn rejected_rows(&self) -> impl Iterator<Item = &RowOutcome> {
        self.rows.iter().filter(|row| row.operation.is_rejected())
    }

    pub fn has_rejections(&self) -> bool {
        self.counts.rejected > 0
    }

    /// All issues: mapping-level first, then row-level in row order.
    pub fn all_issues(&self) -> impl Iterator<Item = &ImportIssue> {
        self.mapping_issues
            .iter()
            .chain(self.rows.iter().flat_map(|row| row.issues.iter()))
    }

    pub fn warning_count(&self) -> usize {
        self.all_issues()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }
}
