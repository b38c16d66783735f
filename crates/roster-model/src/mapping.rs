//! Column mapping types for header-to-field associations.
//!
//! A [`ColumnMapping`] records how one spreadsheet header was (or was not)
//! associated with a schema field, together with enough detail to explain the
//! decision to a reviewer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence tier of a mapping.
///
/// Ordered from weakest to strongest so that `level >= ConfidenceLevel::Medium`
/// reads naturally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Header is not mapped.
    #[default]
    None,
    /// Weak containment match; needs confirmation.
    Low,
    /// Good match that should be reviewed.
    Medium,
    /// Exact key or synonym match.
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Returns a human-readable description of the confidence level.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high confidence - likely correct",
            Self::Medium => "medium confidence - should review",
            Self::Low => "low confidence - needs verification",
            Self::None => "not mapped",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which matching rule produced a mapping score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Standard-normalized header equals the field key.
    KeyExact,
    /// Aggressive-normalized header equals the field key.
    KeyAggressive,
    /// Standard-normalized header equals a synonym.
    SynonymExact,
    /// Aggressive-normalized header equals a synonym.
    SynonymAggressive,
    /// Standard-normalized header contains a synonym.
    SynonymContained,
    /// Aggressive-normalized header contains a synonym.
    SynonymContainedAggressive,
}

impl MatchRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyExact => "key",
            Self::KeyAggressive => "key (aggressive)",
            Self::SynonymExact => "synonym",
            Self::SynonymAggressive => "synonym (aggressive)",
            Self::SynonymContained => "contains synonym",
            Self::SynonymContainedAggressive => "contains synonym (aggressive)",
        }
    }
}

/// How a mapping came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingOrigin {
    /// Proposed by the column matcher.
    #[default]
    Auto,
    /// Chosen by a user.
    Manual,
    /// Restored from a previously confirmed mapping.
    Remembered,
}

/// Why a header was left unmapped even though candidates existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MappingConflict {
    /// Two or more fields tied for the best score against this header.
    TiedFields { candidates: Vec<String> },
    /// Another header claimed the same target with an equal or better score.
    SharedTarget {
        target_key: String,
        competing_headers: Vec<String>,
    },
}

impl fmt::Display for MappingConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TiedFields { candidates } => {
                write!(f, "tied between fields: {}", candidates.join(", "))
            }
            Self::SharedTarget {
                target_key,
                competing_headers,
            } => write!(
                f,
                "'{target_key}' also claimed by: {}",
                competing_headers.join(", ")
            ),
        }
    }
}

/// Association of one source header with at most one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Header text as it appeared in the sheet.
    pub source_header: String,
    /// Zero-based position of the header in the sheet.
    pub column_index: usize,
    /// Target field key, `None` when unmapped.
    pub target_key: Option<String>,
    pub confidence: ConfidenceLevel,
    /// Engine-internal score (0 when unmapped and no candidate existed).
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<MatchRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<MappingConflict>,
    /// Closest field label for an unmapped header. Never applied automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub origin: MappingOrigin,
}

impl ColumnMapping {
    /// An unmapped entry for a header.
    pub fn unmapped(source_header: impl Into<String>, column_index: usize) -> Self {
        Self {
            source_header: source_header.into(),
            column_index,
            target_key: None,
            confidence: ConfidenceLevel::None,
            score: 0.0,
            rule: None,
            conflict: None,
            hint: None,
            origin: MappingOrigin::Auto,
        }
    }

    /// A user-chosen mapping. Manual mappings are always high confidence.
    pub fn manual(
        source_header: impl Into<String>,
        column_index: usize,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            target_key: Some(target_key.into()),
            confidence: ConfidenceLevel::High,
            score: 100.0,
            origin: MappingOrigin::Manual,
            ..Self::unmapped(source_header, column_index)
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.target_key.is_some()
    }

    pub fn target(&self) -> Option<&str> {
        self.target_key.as_deref()
    }
}
