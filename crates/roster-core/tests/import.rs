use std::collections::BTreeMap;

use roster_core::{
    BatchDuplicatePolicy, EmptyIndex, ImportError, ImportOptions, ImportOrchestrator,
    InMemoryIdentityIndex, composite_key, generate_stable_id,
};
use roster_model::{
    CoercedValue, ColumnMapping, ConflictRef, DuplicateStatus, ImportIntent, IssueKind,
    IssueSeverity, ModelError, ParsedSheet, RowIdentity, RowOperation, SchemaField,
};
use roster_standards::{EventSchema, TemplateRegistry};

const BENCH: &str = "x7hG4kL9mN2pQ8vW";

fn schema() -> Vec<SchemaField> {
    let registry = TemplateRegistry::builtin();
    let football = registry.get("football").expect("football template");
    EventSchema::assemble(
        football,
        vec![SchemaField::drill(BENCH, "Bench Press").with_unit("lbs")],
        &[],
    )
    .expect("schema")
    .into_fields()
}

fn sheet(headers: &[&str], rows: &[&[&str]]) -> ParsedSheet {
    let mut sheet = ParsedSheet::new(headers.iter().map(|h| (*h).to_string()).collect());
    for (offset, cells) in rows.iter().enumerate() {
        sheet.push_row(offset + 2, cells.iter().map(|c| (*c).to_string()).collect());
    }
    sheet
}

fn orchestrator(fields: &[SchemaField]) -> ImportOrchestrator<'_> {
    ImportOrchestrator::new(fields, ImportOptions::new("spring"))
}

#[test]
fn roster_and_scores_creates_athletes_with_stable_ids() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name", "Jersey #", "40-Yard Dash", "Bench Press (lbs)"],
        &[
            &["Ann", "Lee", "12", "4.8", "185lbs"],
            &["Bo", "Diaz", "", "4,9", ""],
        ],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterAndScores)
        .expect("import");

    assert!(result.unmapped_columns.is_empty());
    assert_eq!(result.counts.created, 2);
    assert_eq!(result.counts.rejected, 0);

    let ann = &result.rows[0];
    let expected_id = generate_stable_id("spring", "Ann", "Lee", Some("12"));
    assert_eq!(
        ann.operation,
        RowOperation::Create {
            record_id: expected_id.clone()
        }
    );
    let write = ann.write.as_ref().expect("write");
    assert_eq!(write.record_id, expected_id);
    assert_eq!(
        write.scores,
        BTreeMap::from([("40m_dash".to_string(), 4.8), (BENCH.to_string(), 185.0)])
    );
    let roster = write.roster.as_ref().expect("roster values");
    assert_eq!(roster.get("number"), Some(&CoercedValue::Integer(12)));
    assert_eq!(
        roster.get("first_name"),
        Some(&CoercedValue::Text("Ann".to_string()))
    );

    assert_eq!(result.scores.by_field["40m_dash"], 2);
    assert_eq!(result.scores.by_field[BENCH], 1);
    assert_eq!(result.scores.by_field["vertical_jump"], 0);
    assert_eq!(result.scores.total, 3);
    assert!(result.scores.drills_without_scores.is_empty());
}

#[test]
fn same_name_without_numbers_collides_and_says_why() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name"],
        &[&["John", "Smith"], &["John", "Smith"]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .expect("import");

    assert_eq!(result.counts.created, 1);
    assert_eq!(result.counts.rejected, 1);
    let second = &result.rows[1];
    assert_eq!(second.verdict.status, DuplicateStatus::DuplicateInBatch);
    assert_eq!(second.verdict.conflicts_with, Some(ConflictRef::Row(2)));
    let explanation = second.verdict.explanation.as_ref().expect("explanation");
    assert_eq!(explanation.missing, vec!["number".to_string()]);

    let issue = second
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::DuplicateInBatch)
        .expect("duplicate issue");
    assert_eq!(issue.severity, IssueSeverity::Error);
    assert!(issue.message.contains("number"));
}

#[test]
fn reimporting_a_roster_creates_nothing_new() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name", "Number", "Age Group"],
        &[&["Ann", "Lee", "12", "U12"], &["Bo", "Diaz", "7.0", "U14"]],
    );
    let orchestrator = orchestrator(&fields);

    let first = orchestrator
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .expect("first import");
    assert_eq!(first.counts.created, 2);

    let mut index = InMemoryIdentityIndex::new();
    index.absorb(&first);
    let second = orchestrator
        .run(&sheet, &index, ImportIntent::RosterOnly)
        .expect("second import");

    assert_eq!(second.counts.created, 0);
    assert_eq!(second.counts.skipped, 2);
    assert_eq!(second.mapping, first.mapping);
    for (before, after) in first.rows.iter().zip(&second.rows) {
        assert_eq!(before.identity, after.identity);
        assert_eq!(before.operation.record_id(), after.operation.record_id());
        assert_eq!(after.verdict.status, DuplicateStatus::DuplicateExisting);
    }
}

#[test]
fn invalid_targets_and_missing_required_columns_block() {
    let fields = schema();
    let sheet = sheet(&["First Name", "Shoe"], &[&["Ann", "9"]]);
    let mapping = vec![
        ColumnMapping::manual("First Name", 0, "first_name"),
        ColumnMapping::manual("Shoe", 1, "shoe_size"),
    ];
    let err = orchestrator(&fields)
        .run_with_mapping(&sheet, &mapping, &EmptyIndex, ImportIntent::RosterAndScores)
        .unwrap_err();

    let ImportError::Blocked(blocked) = err else {
        panic!("expected a blocked import");
    };
    let invalid = blocked
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::InvalidTargetKey)
        .expect("invalid target issue");
    assert_eq!(invalid.column.as_deref(), Some("Shoe"));
    assert_eq!(invalid.field.as_deref(), Some("shoe_size"));
    let unmapped = blocked
        .issues
        .iter()
        .find(|issue| issue.kind == IssueKind::UnmappedRequiredField)
        .expect("unmapped required issue");
    assert_eq!(unmapped.field.as_deref(), Some("last_name"));
    assert!(blocked.issues.iter().all(|issue| issue.is_blocking()));
    assert_eq!(blocked.mapping.len(), 2);
}

#[test]
fn scores_only_merges_into_existing_and_rejects_unknown() {
    let fields = schema();
    let mut index = InMemoryIdentityIndex::new();
    index.insert(composite_key("Ann", "Lee", Some("12")), "rec-1".to_string());
    let sheet = sheet(
        &["First Name", "Last Name", "Number", "40-Yard Dash"],
        &[&["ANN", "lee", "12.0", "4.5"], &["Cy", "Park", "3", "5.0"]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &index, ImportIntent::ScoresOnly)
        .expect("import");

    assert_eq!(
        result.rows[0].operation,
        RowOperation::MergeScores {
            record_id: "rec-1".to_string()
        }
    );
    let write = result.rows[0].write.as_ref().expect("write");
    assert!(write.roster.is_none());
    assert_eq!(write.scores.get("40m_dash"), Some(&4.5));

    assert_eq!(result.rows[1].operation, RowOperation::Reject);
    assert!(
        result.rows[1]
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::RecordNotFound)
    );
    assert_eq!(result.counts.merged, 1);
    assert_eq!(result.counts.rejected, 1);
}

#[test]
fn scores_only_without_drill_columns_is_blocked() {
    let fields = schema();
    let sheet = sheet(&["First Name", "Last Name"], &[&["Ann", "Lee"]]);
    let err = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::ScoresOnly)
        .unwrap_err();
    let kinds: Vec<_> = err.blocking_issues().iter().map(|issue| issue.kind).collect();
    assert_eq!(kinds, vec![IssueKind::NoScoreColumns]);
}

#[test]
fn range_and_format_problems_only_warn() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name", "40-Yard Dash"],
        &[&["Ann", "Lee", "42"], &["Bo", "Diaz", "fast"]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterAndScores)
        .expect("import");

    assert_eq!(result.counts.created, 2);
    let ann = &result.rows[0];
    assert_eq!(ann.issues[0].kind, IssueKind::OutOfRangeValue);
    assert_eq!(ann.issues[0].severity, IssueSeverity::Warning);
    assert_eq!(
        ann.write.as_ref().and_then(|w| w.scores.get("40m_dash")),
        Some(&42.0)
    );

    let bo = &result.rows[1];
    assert_eq!(bo.issues[0].kind, IssueKind::MalformedValue);
    assert!(bo.write.as_ref().expect("write").scores.is_empty());
}

#[test]
fn batch_duplicates_can_merge_scores() {
    let fields = schema();
    let options = ImportOptions::new("spring").with_batch_duplicates(BatchDuplicatePolicy::MergeScores);
    let sheet = sheet(
        &["First Name", "Last Name", "Number", "40-Yard Dash", "Vertical Jump"],
        &[
            &["Ann", "Lee", "12", "4.8", ""],
            &["Ann", "Lee", "12.0", "4.6", "30"],
        ],
    );
    let result = ImportOrchestrator::new(&fields, options)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterAndScores)
        .expect("import");

    assert_eq!(result.rows[1].operation, RowOperation::MergedIntoRow { row: 2 });
    assert!(result.rows[1].write.is_none());
    let scores = &result.rows[0].write.as_ref().expect("write").scores;
    assert_eq!(scores.get("40m_dash"), Some(&4.6));
    assert_eq!(scores.get("vertical_jump"), Some(&30.0));
    assert_eq!(result.counts.created, 1);
    assert_eq!(result.counts.merged, 1);
}

#[test]
fn mapped_drills_without_scores_are_reported() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name", "40-Yard Dash"],
        &[&["Ann", "Lee", ""]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterAndScores)
        .expect("import");

    assert_eq!(result.scores.mapped_drills, vec!["40m_dash".to_string()]);
    assert_eq!(result.scores.drills_without_scores, vec!["40m_dash".to_string()]);
    assert!(
        result
            .mapping_issues
            .iter()
            .any(|issue| issue.kind == IssueKind::NoScoresWritten)
    );
}

#[test]
fn oversized_sheets_are_blocked() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name"],
        &[&["Ann", "Lee"], &["Bo", "Diaz"]],
    );
    let err = ImportOrchestrator::new(&fields, ImportOptions::new("spring").with_max_rows(1))
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .unwrap_err();
    assert_eq!(err.blocking_issues()[0].kind, IssueKind::TooManyRows);
}

#[test]
fn result_serializes_for_the_caller() {
    let fields = schema();
    let sheet = sheet(&["First Name", "Last Name"], &[&["Ann", "Lee"]]);
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .expect("import");
    let value = serde_json::to_value(&result).expect("json");
    assert_eq!(value["rows"][0]["operation"]["op"], "create");
    assert_eq!(value["rows"][0]["identity"]["strategy"], "composite");
    assert_eq!(value["counts"]["created"], 1);
}

#[test]
fn lettered_numbers_are_distinct_athletes() {
    let fields = schema();
    let sheet = sheet(
        &["First Name", "Last Name", "Number"],
        &[&["Ann", "Lee", "12A"], &["Ann", "Lee", "12B"]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .expect("import");

    assert_eq!(result.counts.created, 2);
    assert_eq!(result.counts.rejected, 0);
    let ids: Vec<_> = result.rows.iter().map(|row| row.operation.record_id()).collect();
    assert_ne!(ids[0], ids[1]);
    for row in &result.rows {
        assert_eq!(row.verdict.status, DuplicateStatus::Unique);
        assert!(row.issues.iter().any(|issue| issue.kind == IssueKind::MalformedValue));
    }
}

#[test]
fn single_name_column_splits_into_first_and_last() {
    let fields = schema();
    let sheet = sheet(
        &["Player Name", "Jersey #", "40-Yard Dash"],
        &[
            &["Ann Lee", "12", "4.8"],
            &["Diaz, Bo", "7", "5.0"],
            &["Madonna", "3", "5.1"],
        ],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterAndScores)
        .expect("import");

    assert_eq!(result.mapping[0].target(), Some("full_name"));
    assert_eq!(result.counts.created, 2);
    assert_eq!(result.counts.rejected, 1);
    assert_eq!(
        result.rows[0].operation,
        RowOperation::Create {
            record_id: generate_stable_id("spring", "Ann", "Lee", Some("12"))
        }
    );
    let Some(RowIdentity::Composite {
        first_name,
        last_name,
        ..
    }) = &result.rows[1].identity
    else {
        panic!("expected a composite identity");
    };
    assert_eq!((first_name.as_str(), last_name.as_str()), ("bo", "diaz"));
    assert!(
        result.rows[2]
            .issues
            .iter()
            .any(|issue| issue.kind == IssueKind::MissingRequiredValue)
    );
}

#[test]
fn rejected_row_does_not_claim_its_identity() {
    let fields = schema();
    let sheet = sheet(
        &["External ID", "First Name", "Last Name"],
        &[&["B-17", "", "Lee"], &["B-17", "Ann", "Lee"]],
    );
    let result = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .expect("import");

    assert_eq!(result.rows[0].operation, RowOperation::Reject);
    assert_eq!(result.rows[1].verdict.status, DuplicateStatus::Unique);
    assert!(matches!(result.rows[1].operation, RowOperation::Create { .. }));
    assert_eq!(result.counts.created, 1);
    assert_eq!(result.counts.rejected, 1);
}

#[test]
fn duplicate_field_keys_are_a_schema_error() {
    let fields = vec![
        SchemaField::roster("first_name", "First Name").required(),
        SchemaField::roster("last_name", "Last Name").required(),
        SchemaField::drill("agility", "Agility"),
        SchemaField::drill("agility", "Agility (Cones)"),
    ];
    let sheet = sheet(&["First Name", "Last Name"], &[&["Ann", "Lee"]]);
    let err = orchestrator(&fields)
        .run(&sheet, &EmptyIndex, ImportIntent::RosterOnly)
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Schema(ModelError::DuplicateKey { ref key }) if key == "agility"
    ));
}
