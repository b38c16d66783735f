//! Confirmed mapping types shared by the mapping state and repository.

use serde::{Deserialize, Serialize};

use roster_model::ColumnMapping;

use crate::normalize::normalize;

/// One header a user confirmed for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedColumn {
    pub source_header: String,
    pub target_key: String,
}

/// Mapping a user confirmed for an event, reusable on the next upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedMapping {
    pub event_id: String,
    /// Confirmed columns in header order.
    pub columns: Vec<ConfirmedColumn>,
    /// Headers the user left unmapped.
    #[serde(default)]
    pub unmapped_columns: Vec<String>,
}

impl ConfirmedMapping {
    /// Builds a confirmed mapping from the mapped entries of a proposal.
    pub fn from_mappings(event_id: impl Into<String>, mappings: &[ColumnMapping]) -> Self {
        let mut confirmed = Self {
            event_id: event_id.into(),
            ..Self::default()
        };
        for mapping in mappings {
            match mapping.target() {
                Some(target) => confirmed.columns.push(ConfirmedColumn {
                    source_header: mapping.source_header.clone(),
                    target_key: target.to_string(),
                }),
                None => confirmed
                    .unmapped_columns
                    .push(mapping.source_header.clone()),
            }
        }
        confirmed
    }

    /// Target remembered for `header`, compared after normalization.
    pub fn target_for(&self, header: &str) -> Option<&str> {
        let wanted = normalize(header);
        if wanted.is_empty() {
            return None;
        }
        self.columns
            .iter()
            .find(|column| normalize(&column.source_header) == wanted)
            .map(|column| column.target_key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_lookup_ignores_case_and_spacing() {
        let confirmed = ConfirmedMapping::from_mappings(
            "evt",
            &[
                ColumnMapping::manual("Bench  Press", 0, "x7hG4kL9mN2pQ8vW"),
                ColumnMapping::unmapped("Shoe Size", 1),
            ],
        );
        assert_eq!(confirmed.target_for("bench press"), Some("x7hG4kL9mN2pQ8vW"));
        assert_eq!(confirmed.unmapped_columns, vec!["Shoe Size".to_string()]);
        assert_eq!(confirmed.target_for(""), None);
    }
}
