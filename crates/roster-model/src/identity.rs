use std::fmt;

use serde::{Deserialize, Serialize};

/// Which strategy produced a row identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    ExternalId,
    Composite,
}

impl IdentityStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalId => "external_id",
            Self::Composite => "composite",
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved identity of a row.
///
/// Two rows refer to the same entity exactly when their `identity_key`s are
/// equal. The other fields are kept for explanations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RowIdentity {
    ExternalId {
        value: String,
        identity_key: String,
    },
    Composite {
        first_name: String,
        last_name: String,
        /// Normalized number, `None` when the row carried no number.
        number: Option<String>,
        identity_key: String,
    },
}

impl RowIdentity {
    pub fn identity_key(&self) -> &str {
        match self {
            Self::ExternalId { identity_key, .. } | Self::Composite { identity_key, .. } => {
                identity_key
            }
        }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        match self {
            Self::ExternalId { .. } => IdentityStrategy::ExternalId,
            Self::Composite { .. } => IdentityStrategy::Composite,
        }
    }

    pub fn has_number(&self) -> bool {
        matches!(self, Self::Composite { number: Some(_), .. })
    }
}
