//! Import orchestration.
//!
//! Sequences one import run: the mapping is checked for blocking problems,
//! rows are reshaped and validated, identities resolved, duplicates
//! detected, and every row ends in exactly one [`RowOperation`]:
//!
//! ```text
//! parsed -> mapped -> identified -> duplicate-checked -> create | update | merge | skip | reject
//! ```
//!
//! Blocking issues abort before any row is looked at. Everything else is
//! attached to the row or to the result.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, info_span, trace, warn};

use roster_map::{ColumnMatcher, MappingProposal};
use roster_model::{
    CoercedValue, ColumnMapping, ConfidenceLevel, ConflictRef, DuplicateStatus, FieldKind,
    ImportCounts, ImportIntent, ImportIssue, ImportResult, ImportRow, IssueKind, IssueSeverity,
    MappingOrigin, ParsedSheet, RecordWrite, Resolution, RowIdentity, RowOperation, RowOutcome,
    ScoreDiagnostics, SchemaField, validate_fields,
};

use crate::duplicates::{DuplicateDetector, verdict_issue};
use crate::error::{ImportError, Result};
use crate::identity::{IdentityResolver, stable_id_for};
use crate::index::IdentityIndex;
use crate::options::ImportOptions;
use crate::redact::redact_value;
use crate::validate::{MappedColumn, NameKeys, missing_required, shape_row, split_full_name};

/// Runs imports of sheets against one event schema.
#[derive(Debug, Clone)]
pub struct ImportOrchestrator<'a> {
    fields: &'a [SchemaField],
    options: ImportOptions,
}

impl<'a> ImportOrchestrator<'a> {
    pub fn new(fields: &'a [SchemaField], options: ImportOptions) -> Self {
        Self { fields, options }
    }

    pub fn fields(&self) -> &'a [SchemaField] {
        self.fields
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// The matcher configured from these options.
    pub fn matcher(&self) -> ColumnMatcher {
        ColumnMatcher::new(self.fields)
            .with_thresholds(self.options.thresholds)
            .allow_shared_targets(self.options.allow_shared_targets)
    }

    /// Proposes a mapping for the sheet's headers.
    pub fn propose_mapping(&self, headers: &[String]) -> MappingProposal {
        self.matcher().match_headers(headers)
    }

    /// Maps the sheet automatically, then imports it.
    pub fn run(
        &self,
        sheet: &ParsedSheet,
        index: &dyn IdentityIndex,
        intent: ImportIntent,
    ) -> Result<ImportResult> {
        let proposal = self.propose_mapping(&sheet.headers);
        self.run_with_mapping(sheet, &proposal.mappings, index, intent)
    }

    /// Imports a sheet under a reviewed mapping.
    ///
    /// `mapping` holds one entry per sheet column. Returns
    /// [`ImportError::Schema`] when the fields themselves are invalid (for
    /// example two fields share a key) and [`ImportError::Blocked`] when a
    /// required field has no column, a column targets a key the schema does
    /// not have, a scores-only import has no drill column, or the sheet
    /// exceeds `max_rows`.
    pub fn run_with_mapping(
        &self,
        sheet: &ParsedSheet,
        mapping: &[ColumnMapping],
        index: &dyn IdentityIndex,
        intent: ImportIntent,
    ) -> Result<ImportResult> {
        let event_id = self.options.event_id.as_str();
        let _span = info_span!("import", event_id, intent = %intent).entered();
        info!(rows = sheet.row_count(), columns = sheet.headers.len(), "import started");
        validate_fields(self.fields)?;

        let (mapping, mut mapping_issues) = self.effective_mapping(mapping);
        self.check_blocking(sheet, &mapping, intent)?;
        let columns = self.mapped_columns(&mapping);
        let required = self.required_fields(&mapping, intent);

        let keys = &self.options.identity_keys;
        let names = NameKeys {
            full: &keys.full_name,
            first: &keys.first_name,
            last: &keys.last_name,
        };
        let resolver = IdentityResolver::new(keys.clone());
        let mut rows = Vec::with_capacity(sheet.row_count());
        let mut row_issues = Vec::with_capacity(sheet.row_count());
        for sheet_row in &sheet.rows {
            let (mut row, mut issues) = shape_row(sheet_row, &columns);
            split_full_name(&mut row, names);
            issues.extend(missing_required(&row, &required));
            rows.push(row);
            row_issues.push(issues);
        }
        let identities: Vec<Option<RowIdentity>> =
            rows.iter().map(|row| resolver.resolve(row)).collect();

        // Rows already rejected must not claim an identity in the batch.
        let claimable: Vec<Option<RowIdentity>> = identities
            .iter()
            .zip(&row_issues)
            .map(|(identity, issues)| {
                let rejected = issues.iter().any(|issue| issue.severity == IssueSeverity::Error);
                identity.clone().filter(|_| !rejected)
            })
            .collect();
        let detector = DuplicateDetector::new(self.options.duplicate_policy(intent))
            .with_identity_keys(keys.clone());
        let verdicts = detector.detect(&rows, &claimable, index);

        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(rows.len());
        let mut outcome_by_line: BTreeMap<usize, usize> = BTreeMap::new();
        for (((row, identity), verdict), mut issues) in rows
            .iter()
            .zip(identities)
            .zip(verdicts)
            .zip(row_issues)
        {
            issues.extend(verdict_issue(&verdict, row.line));
            let mut outcome = RowOutcome {
                row: row.line,
                identity,
                verdict,
                operation: RowOperation::Reject,
                write: None,
                issues,
            };
            self.decide(row, &mut outcome, &mut outcomes, &outcome_by_line, intent);
            trace!(
                row = row.line,
                op = outcome.operation.as_str(),
                key = outcome.identity.as_ref().map_or("-", |i| redact_value(i.identity_key())),
                "row resolved"
            );
            outcome_by_line.insert(row.line, outcomes.len());
            outcomes.push(outcome);
        }

        let scores = self.score_diagnostics(&outcomes, &columns);
        if intent.writes_scores() && !scores.mapped_drills.is_empty() && scores.total == 0 {
            warn!(
                mapped_drills = scores.mapped_drills.len(),
                "drill columns were mapped but no scores were written"
            );
            mapping_issues.push(ImportIssue::new(
                IssueKind::NoScoresWritten,
                format!(
                    "{} drill column(s) mapped but 0 scores written; check the mapping",
                    scores.mapped_drills.len()
                ),
            ));
        }

        let unmapped_columns: Vec<String> = mapping
            .iter()
            .filter(|m| !m.is_mapped())
            .map(|m| m.source_header.clone())
            .collect();
        let targeted: BTreeSet<&str> = mapping.iter().filter_map(ColumnMapping::target).collect();
        let unmapped_fields: Vec<String> = self
            .fields
            .iter()
            .filter(|field| !targeted.contains(field.key.as_str()))
            .map(|field| field.key.clone())
            .collect();

        let counts = count_outcomes(&outcomes, unmapped_columns.len(), unmapped_fields.len());
        info!(
            created = counts.created,
            updated = counts.updated,
            merged = counts.merged,
            skipped = counts.skipped,
            rejected = counts.rejected,
            scores = scores.total,
            "IMPORT_SUMMARY"
        );

        Ok(ImportResult {
            event_id: event_id.to_string(),
            intent,
            mapping,
            unmapped_columns,
            unmapped_fields,
            rows: outcomes,
            counts,
            scores,
            mapping_issues,
        })
    }

    /// Applies `min_confidence` and the shared-target policy to a mapping.
    ///
    /// Reviewed mappings (manual or remembered) are always kept.
    fn effective_mapping(&self, mapping: &[ColumnMapping]) -> (Vec<ColumnMapping>, Vec<ImportIssue>) {
        let mut issues = Vec::new();
        let mut mapping: Vec<ColumnMapping> = mapping.to_vec();

        for column in &mut mapping {
            if column.is_mapped()
                && column.origin == MappingOrigin::Auto
                && column.confidence < self.options.min_confidence
            {
                debug!(
                    header = %column.source_header,
                    confidence = %column.confidence,
                    "mapping below minimum confidence ignored"
                );
                column.target_key = None;
                column.confidence = ConfidenceLevel::None;
            }
        }

        if !self.options.allow_shared_targets {
            let mut claimed: BTreeMap<String, String> = BTreeMap::new();
            for column in &mut mapping {
                let Some(target) = column.target_key.clone() else {
                    continue;
                };
                if let Some(first) = claimed.get(&target) {
                    issues.push(
                        ImportIssue::new(
                            IssueKind::AmbiguousMapping,
                            format!(
                                "column '{}' ignored: '{target}' is already fed by column '{first}'",
                                column.source_header
                            ),
                        )
                        .for_column(&column.source_header)
                        .for_field(&target),
                    );
                    column.target_key = None;
                    column.confidence = ConfidenceLevel::None;
                } else {
                    claimed.insert(target, column.source_header.clone());
                }
            }
        }

        issues.extend(mapping.iter().filter_map(|m| {
            m.conflict.as_ref().map(|conflict| {
                ImportIssue::new(
                    IssueKind::AmbiguousMapping,
                    format!("column '{}' left unmapped: {conflict}", m.source_header),
                )
                .for_column(&m.source_header)
            })
        }));
        (mapping, issues)
    }

    fn field(&self, key: &str) -> Option<&'a SchemaField> {
        self.fields.iter().find(|field| field.key == key)
    }

    fn mapped_columns<'m>(&self, mapping: &'m [ColumnMapping]) -> Vec<MappedColumn<'m>>
    where
        'a: 'm,
    {
        mapping
            .iter()
            .filter_map(|m| {
                let field = self.field(m.target()?)?;
                Some(MappedColumn {
                    index: m.column_index,
                    header: m.source_header.as_str(),
                    field,
                })
            })
            .collect()
    }

    /// Required fields for this intent.
    ///
    /// A scores-only import identified by external id does not need names.
    fn required_fields(&self, mapping: &[ColumnMapping], intent: ImportIntent) -> Vec<&'a SchemaField> {
        let keys = &self.options.identity_keys;
        let external_mapped = mapping.iter().any(|m| m.target() == Some(keys.external_id.as_str()));
        self.fields
            .iter()
            .filter(|field| field.required)
            .filter(|field| {
                !(intent == ImportIntent::ScoresOnly
                    && external_mapped
                    && (field.key == keys.first_name || field.key == keys.last_name))
            })
            .collect()
    }

    fn check_blocking(
        &self,
        sheet: &ParsedSheet,
        mapping: &[ColumnMapping],
        intent: ImportIntent,
    ) -> Result<()> {
        let mut blocking = Vec::new();

        for column in mapping {
            if let Some(target) = column.target()
                && self.field(target).is_none()
            {
                blocking.push(
                    ImportIssue::new(
                        IssueKind::InvalidTargetKey,
                        format!(
                            "column '{}' is mapped to '{target}', which is not a field of this event",
                            column.source_header
                        ),
                    )
                    .for_column(&column.source_header)
                    .for_field(target),
                );
            }
        }

        let mapped: BTreeSet<&str> = mapping.iter().filter_map(ColumnMapping::target).collect();
        let mapped_fields: Vec<&SchemaField> =
            mapped.iter().filter_map(|key| self.field(key)).collect();
        for field in self.required_fields(mapping, intent) {
            if !mapped_fields.iter().any(|mapped| mapped.satisfies(&field.key)) {
                blocking.push(
                    ImportIssue::new(
                        IssueKind::UnmappedRequiredField,
                        format!("no column is mapped to required field '{}'", field.label),
                    )
                    .for_field(&field.key),
                );
            }
        }

        if intent == ImportIntent::ScoresOnly
            && !mapped
                .iter()
                .any(|key| self.field(key).is_some_and(SchemaField::is_drill))
        {
            blocking.push(ImportIssue::new(
                IssueKind::NoScoreColumns,
                "scores-only import has no column mapped to a drill",
            ));
        }

        if sheet.row_count() > self.options.max_rows {
            blocking.push(ImportIssue::new(
                IssueKind::TooManyRows,
                format!(
                    "sheet has {} data rows; the limit is {}",
                    sheet.row_count(),
                    self.options.max_rows
                ),
            ));
        }

        if blocking.is_empty() {
            return Ok(());
        }
        for issue in &blocking {
            warn!(kind = %issue.kind, "{}", issue.message);
        }
        Err(ImportError::blocked(blocking, mapping.to_vec()))
    }

    /// Decides the operation for one row and builds its write.
    fn decide(
        &self,
        row: &ImportRow,
        outcome: &mut RowOutcome,
        earlier: &mut [RowOutcome],
        outcome_by_line: &BTreeMap<usize, usize>,
        intent: ImportIntent,
    ) {
        if outcome
            .issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Error && !is_duplicate_kind(issue.kind))
        {
            return;
        }
        let Some(identity) = outcome.identity.as_ref() else {
            outcome.issues.push(
                ImportIssue::new(
                    IssueKind::MissingRequiredValue,
                    "row has neither an external id nor both names",
                )
                .with_severity(IssueSeverity::Error)
                .at_row(row.line),
            );
            return;
        };
        let new_record_id = stable_id_for(&self.options.event_id, identity);

        let roster = intent.writes_roster().then(|| self.roster_values(row));
        let scores = if intent.writes_scores() {
            self.score_values(row)
        } else {
            BTreeMap::new()
        };

        match (outcome.verdict.status, outcome.verdict.conflicts_with.clone()) {
            (DuplicateStatus::Unique, _) => {
                if !intent.allows_create() {
                    outcome.issues.push(
                        ImportIssue::new(
                            IssueKind::RecordNotFound,
                            "player not found; scores-only imports never create athletes",
                        )
                        .at_row(row.line),
                    );
                    return;
                }
                outcome.operation = RowOperation::Create {
                    record_id: new_record_id.clone(),
                };
                outcome.write = Some(RecordWrite {
                    record_id: new_record_id,
                    roster,
                    scores,
                });
            }
            (DuplicateStatus::DuplicateExisting, Some(ConflictRef::Existing(record_id))) => {
                match outcome.verdict.resolution {
                    Some(Resolution::Skip) => {
                        outcome.operation = RowOperation::Skip { record_id };
                    }
                    Some(Resolution::Overwrite) => {
                        outcome.operation = RowOperation::Update {
                            record_id: record_id.clone(),
                        };
                        outcome.write = Some(RecordWrite {
                            record_id,
                            roster,
                            scores,
                        });
                    }
                    Some(Resolution::MergeScores) => {
                        outcome.operation = RowOperation::MergeScores {
                            record_id: record_id.clone(),
                        };
                        outcome.write = Some(RecordWrite {
                            record_id,
                            roster,
                            scores,
                        });
                    }
                    Some(Resolution::Reject) | None => {}
                }
            }
            (DuplicateStatus::DuplicateInBatch, Some(ConflictRef::Row(first_line))) => {
                if outcome.verdict.resolution != Some(Resolution::MergeScores) {
                    return;
                }
                let first = outcome_by_line
                    .get(&first_line)
                    .and_then(|&position| earlier.get_mut(position))
                    .and_then(|first| first.write.as_mut());
                let Some(first_write) = first else {
                    outcome.issues.push(
                        ImportIssue::new(
                            IssueKind::DuplicateInBatch,
                            format!("row {first_line} was not imported, so nothing to merge into"),
                        )
                        .with_severity(IssueSeverity::Error)
                        .at_row(row.line),
                    );
                    return;
                };
                first_write.scores.extend(scores);
                outcome.operation = RowOperation::MergedIntoRow { row: first_line };
            }
            (status, conflict) => {
                debug!(row = row.line, ?status, ?conflict, "verdict without a usable conflict");
            }
        }
    }

    fn roster_values(&self, row: &ImportRow) -> BTreeMap<String, CoercedValue> {
        self.fields
            .iter()
            .filter(|field| field.kind == FieldKind::Roster)
            .filter_map(|field| {
                let value = row.get(&field.key)?.coerced.clone()?;
                Some((field.key.clone(), value))
            })
            .collect()
    }

    fn score_values(&self, row: &ImportRow) -> BTreeMap<String, f64> {
        self.fields
            .iter()
            .filter(|field| field.is_drill())
            .filter_map(|field| {
                let value = row.get(&field.key)?.coerced.as_ref()?.as_f64()?;
                Some((field.key.clone(), value))
            })
            .collect()
    }

    fn score_diagnostics(&self, outcomes: &[RowOutcome], columns: &[MappedColumn<'_>]) -> ScoreDiagnostics {
        let mut by_field: BTreeMap<String, usize> = self
            .fields
            .iter()
            .filter(|field| field.is_drill())
            .map(|field| (field.key.clone(), 0))
            .collect();
        for write in outcomes.iter().filter_map(|outcome| outcome.write.as_ref()) {
            for key in write.scores.keys() {
                if let Some(count) = by_field.get_mut(key) {
                    *count += 1;
                }
            }
        }
        let total = by_field.values().sum();

        let mut mapped_drills: Vec<String> = Vec::new();
        for column in columns.iter().filter(|column| column.field.is_drill()) {
            if !mapped_drills.contains(&column.field.key) {
                mapped_drills.push(column.field.key.clone());
            }
        }
        let drills_without_scores = mapped_drills
            .iter()
            .filter(|key| by_field.get(key.as_str()).is_none_or(|count| *count == 0))
            .cloned()
            .collect();

        ScoreDiagnostics {
            by_field,
            total,
            mapped_drills,
            drills_without_scores,
        }
    }
}

fn is_duplicate_kind(kind: IssueKind) -> bool {
    matches!(kind, IssueKind::DuplicateInBatch | IssueKind::DuplicateExisting)
}

fn count_outcomes(outcomes: &[RowOutcome], unmapped_columns: usize, unmapped_fields: usize) -> ImportCounts {
    let mut counts = ImportCounts {
        rows: outcomes.len(),
        unmapped_columns,
        unmapped_fields,
        ..ImportCounts::default()
    };
    for outcome in outcomes {
        match outcome.operation {
            RowOperation::Create { .. } => counts.created += 1,
            RowOperation::Update { .. } => counts.updated += 1,
            RowOperation::MergeScores { .. } | RowOperation::MergedIntoRow { .. } => {
                counts.merged += 1;
            }
            RowOperation::Skip { .. } => counts.skipped += 1,
            RowOperation::Reject => counts.rejected += 1,
        }
    }
    counts
}

/// Imports `sheet` into `fields` with default options.
pub fn run(
    sheet: &ParsedSheet,
    fields: &[SchemaField],
    index: &dyn IdentityIndex,
    intent: ImportIntent,
) -> Result<ImportResult> {
    ImportOrchestrator::new(fields, ImportOptions::default()).run(sheet, index, intent)
}
