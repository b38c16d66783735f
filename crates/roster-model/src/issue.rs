use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Stops the whole import before any row is processed.
    Blocking,
    /// Rejects the affected row.
    Error,
    /// Surfaced in the summary; the row proceeds.
    Warning,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnmappedRequiredField,
    InvalidTargetKey,
    AmbiguousMapping,
    OutOfRangeValue,
    DuplicateInBatch,
    DuplicateExisting,
    MalformedValue,
    MissingRequiredValue,
    NoScoreColumns,
    TooManyRows,
    RecordNotFound,
    NoScoresWritten,
    ExtraCells,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnmappedRequiredField => "unmapped_required_field",
            Self::InvalidTargetKey => "invalid_target_key",
            Self::AmbiguousMapping => "ambiguous_mapping",
            Self::OutOfRangeValue => "out_of_range_value",
            Self::DuplicateInBatch => "duplicate_in_batch",
            Self::DuplicateExisting => "duplicate_existing",
            Self::MalformedValue => "malformed_value",
            Self::MissingRequiredValue => "missing_required_value",
            Self::NoScoreColumns => "no_score_columns",
            Self::TooManyRows => "too_many_rows",
            Self::RecordNotFound => "record_not_found",
            Self::NoScoresWritten => "no_scores_written",
            Self::ExtraCells => "extra_cells",
        }
    }

    /// Severity an issue of this kind carries unless policy overrides it.
    ///
    /// Duplicate kinds default to warnings; the detector raises them to
    /// errors when the resolution is `reject`.
    pub fn default_severity(&self) -> IssueSeverity {
        match self {
            Self::UnmappedRequiredField
            | Self::InvalidTargetKey
            | Self::NoScoreColumns
            | Self::TooManyRows => IssueSeverity::Blocking,
            Self::MissingRequiredValue | Self::RecordNotFound => IssueSeverity::Error,
            Self::AmbiguousMapping
            | Self::OutOfRangeValue
            | Self::DuplicateInBatch
            | Self::DuplicateExisting
            | Self::MalformedValue
            | Self::NoScoresWritten
            | Self::ExtraCells => IssueSeverity::Warning,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic attached to the mapping, a row, or the whole import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
    /// Source line, for row-level issues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Schema field key involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Source header involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl ImportIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            row: None,
            field: None,
            column: None,
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: IssueSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn at_row(mut self, line: usize) -> Self {
        self.row = Some(line);
        self
    }

    #[must_use]
    pub fn for_field(mut self, key: impl Into<String>) -> Self {
        self.field = Some(key.into());
        self
    }

    #[must_use]
    pub fn for_column(mut self, header: impl Into<String>) -> Self {
        self.column = Some(header.into());
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == IssueSeverity::Blocking
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(row) = self.row {
            write!(f, " (row {row})")?;
        }
        Ok(())
    }
}
