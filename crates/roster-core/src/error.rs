//! Error types for import runs.

use std::path::PathBuf;

use thiserror::Error;

use roster_model::{ColumnMapping, ImportIssue, ModelError};

/// Everything a caller needs to explain why an import never started.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedImport {
    /// Every blocking issue, not just the first.
    pub issues: Vec<ImportIssue>,
    /// The mapping that was evaluated.
    pub mapping: Vec<ColumnMapping>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// Blocking issues found before any row was processed.
    #[error("import blocked by {} issue(s): {}", .0.issues.len(), first_message(&.0.issues))]
    Blocked(Box<BlockedImport>),

    /// The event schema itself is unusable, e.g. two fields share a key.
    #[error("invalid event schema: {0}")]
    Schema(#[from] ModelError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid import options in {path}: {source}")]
    Options {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn first_message(issues: &[ImportIssue]) -> &str {
    issues.first().map_or("", |issue| issue.message.as_str())
}

impl ImportError {
    pub fn blocked(issues: Vec<ImportIssue>, mapping: Vec<ColumnMapping>) -> Self {
        Self::Blocked(Box::new(BlockedImport { issues, mapping }))
    }

    /// Blocking issues, when this is [`ImportError::Blocked`].
    pub fn blocking_issues(&self) -> &[ImportIssue] {
        match self {
            Self::Blocked(blocked) => &blocked.issues,
            _ => &[],
        }
    }
}

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
