#![deny(unsafe_code)]

//! Shared types for roster imports.
//!
//! Schema fields, parsed sheets, column mappings, row identities, duplicate
//! verdicts and the import result all live here so the ingest, mapping and
//! reconciliation crates agree on one vocabulary.

pub mod error;
pub mod identity;
pub mod intent;
pub mod issue;
pub mod mapping;
pub mod result;
pub mod schema;
pub mod sheet;
pub mod verdict;

pub use error::{ModelError, Result};
pub use identity::{IdentityStrategy, RowIdentity};
pub use intent::ImportIntent;
pub use issue::{ImportIssue, IssueKind, IssueSeverity};
pub use mapping::{ColumnMapping, ConfidenceLevel, MappingConflict, MappingOrigin, MatchRule};
pub use result::{
    ImportCounts, ImportResult, RecordWrite, RowOperation, RowOutcome, ScoreDiagnostics,
};
pub use schema::{FieldKind, SchemaField, ValueRange, ValueType, find_field, validate_fields};
pub use sheet::{CoercedValue, FieldValue, ImportRow, ParsedSheet, SheetRow, FIRST_DATA_LINE};
pub use verdict::{
    ConflictRef, DuplicateExplanation, DuplicateStatus, DuplicateVerdict, Resolution,
};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn sample_result() -> ImportResult {
        let warning = ImportIssue::new(IssueKind::OutOfRangeValue, "40m_dash 42 outside 3-15")
            .at_row(3)
            .for_field("40m_dash");
        ImportResult {
            event_id: "evt".to_string(),
            intent: ImportIntent::RosterAndScores,
            mapping: vec![ColumnMapping::manual("First", 0, "first_name")],
            unmapped_columns: vec![],
            unmapped_fields: vec!["notes".to_string()],
            rows: vec![
                RowOutcome {
                    row: 2,
                    identity: None,
                    verdict: DuplicateVerdict::unique(),
                    operation: RowOperation::Reject,
                    write: None,
                    issues: vec![ImportIssue::new(
                        IssueKind::MissingRequiredValue,
                        "last_name is required",
                    )
                    .at_row(2)],
                },
                RowOutcome {
                    row: 3,
                    identity: None,
                    verdict: DuplicateVerdict::unique(),
                    operation: RowOperation::Create {
                        record_id: "abc".to_string(),
                    },
                    write: Some(RecordWrite {
                        record_id: "abc".to_string(),
                        roster: Some(BTreeMap::new()),
                        scores: BTreeMap::from([("40m_dash".to_string(), 42.0)]),
                    }),
                    issues: vec![warning],
                },
            ],
            counts: ImportCounts {
                rows: 2,
                created: 1,
                rejected: 1,
                unmapped_fields: 1,
                ..ImportCounts::default()
            },
            scores: ScoreDiagnostics::default(),
            mapping_issues: vec![],
        }
    }

    #[test]
    fn result_helpers() {
        let result = sample_result();
        assert_eq!(result.writes().count(), 1);
        assert_eq!(result.rejected_rows().count(), 1);
        assert!(result.has_rejections());
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.rows[0].errors().count(), 1);
    }

    #[test]
    fn result_serializes() {
        let result = sample_result();
        let json = serde_json::to_string(&result).expect("serialize result");
        let round: ImportResult = serde_json::from_str(&json).expect("deserialize result");
        assert_eq!(round.event_id, "evt");
        assert_eq!(round.rows[1].operation.record_id(), Some("abc"));

        let value: serde_json::Value = serde_json::from_str(&json).expect("parse json");
        assert_eq!(value["intent"], "roster_and_scores");
        assert_eq!(value["rows"][1]["operation"]["op"], "create");
    }
}
