//! Duplicate detection within a batch and against stored records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use roster_model::{
    ConflictRef, DuplicateExplanation, DuplicateStatus, DuplicateVerdict, IdentityStrategy,
    ImportIntent, ImportIssue, ImportRow, IssueKind, IssueSeverity, Resolution, RowIdentity,
};

use crate::identity::IdentityKeys;
use crate::index::IdentityIndex;

/// What to do with a second row carrying an identity already seen in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchDuplicatePolicy {
    #[default]
    Reject,
    /// Fold the later row's scores into the first row.
    MergeScores,
}

/// What a roster-only import does with athletes that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterDuplicatePolicy {
    #[default]
    Skip,
    Overwrite,
}

/// Resolutions applied to each duplicate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatePolicy {
    pub in_batch: Resolution,
    pub existing: Resolution,
}

impl DuplicatePolicy {
    /// Roster-only imports leave existing athletes alone (or overwrite them);
    /// score imports merge into them, since scores usually arrive over
    /// several uploads for one roster.
    pub fn for_intent(
        intent: ImportIntent,
        batch: BatchDuplicatePolicy,
        roster: RosterDuplicatePolicy,
    ) -> Self {
        let in_batch = match batch {
            BatchDuplicatePolicy::Reject => Resolution::Reject,
            BatchDuplicatePolicy::MergeScores => Resolution::MergeScores,
        };
        let existing = match (intent, roster) {
            (ImportIntent::RosterOnly, RosterDuplicatePolicy::Skip) => Resolution::Skip,
            (ImportIntent::RosterOnly, RosterDuplicatePolicy::Overwrite) => Resolution::Overwrite,
            (ImportIntent::RosterAndScores | ImportIntent::ScoresOnly, _) => {
                Resolution::MergeScores
            }
        };
        Self { in_batch, existing }
    }
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::for_intent(
            ImportIntent::default(),
            BatchDuplicatePolicy::default(),
            RosterDuplicatePolicy::default(),
        )
    }
}

/// Assigns a [`DuplicateVerdict`] to every row.
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    policy: DuplicatePolicy,
    keys: IdentityKeys,
}

impl DuplicateDetector {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            keys: IdentityKeys::default(),
        }
    }

    #[must_use]
    pub fn with_identity_keys(mut self, keys: IdentityKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Checks rows in source order.
    ///
    /// The first row with a given identity key is compared with `index`;
    /// later rows with the same key are in-batch duplicates of it. Rows
    /// without an identity are reported unique and left to the caller.
    pub fn detect(
        &self,
        rows: &[ImportRow],
        identities: &[Option<RowIdentity>],
        index: &dyn IdentityIndex,
    ) -> Vec<DuplicateVerdict> {
        let mut first_seen: BTreeMap<&str, (usize, Option<&str>)> = BTreeMap::new();
        let mut verdicts = Vec::with_capacity(rows.len());

        for (row, identity) in rows.iter().zip(identities) {
            let Some(identity) = identity else {
                verdicts.push(DuplicateVerdict::unique());
                continue;
            };
            let key = identity.identity_key();
            let group = row.raw(&self.keys.group);

            if let Some(&(first_line, first_group)) = first_seen.get(key) {
                debug!(row = row.line, first_row = first_line, "duplicate in batch");
                verdicts.push(DuplicateVerdict {
                    status: DuplicateStatus::DuplicateInBatch,
                    conflicts_with: Some(ConflictRef::Row(first_line)),
                    resolution: Some(self.policy.in_batch),
                    explanation: Some(explain(
                        identity,
                        &format!("row {first_line}"),
                        group.is_some() && first_group.is_some() && group != first_group,
                    )),
                });
                continue;
            }
            first_seen.insert(key, (row.line, group));

            match index.lookup(key) {
                Some(record_id) => {
                    debug!(row = row.line, record = %record_id, "matches existing record");
                    let explanation = explain(identity, &format!("existing record {record_id}"), false);
                    verdicts.push(DuplicateVerdict {
                        status: DuplicateStatus::DuplicateExisting,
                        conflicts_with: Some(ConflictRef::Existing(record_id)),
                        resolution: Some(self.policy.existing),
                        explanation: Some(explanation),
                    });
                }
                None => verdicts.push(DuplicateVerdict::unique()),
            }
        }
        verdicts
    }
}

/// Spells out which identity fields made two rows collide.
fn explain(identity: &RowIdentity, other: &str, groups_differ: bool) -> DuplicateExplanation {
    match identity {
        RowIdentity::ExternalId { value, .. } => DuplicateExplanation {
            strategy: IdentityStrategy::ExternalId,
            matched_on: vec!["external_id".to_string()],
            missing: Vec::new(),
            message: format!("external id '{value}' is already used by {other}"),
        },
        RowIdentity::Composite {
            first_name,
            last_name,
            number,
            ..
        } => {
            let mut matched_on = vec!["first_name".to_string(), "last_name".to_string()];
            let mut missing = Vec::new();
            let mut message = match number {
                Some(number) => {
                    matched_on.push("number".to_string());
                    format!(
                        "same first name, last name and number ({first_name} {last_name} #{number}) as {other}"
                    )
                }
                None => {
                    missing.push("number".to_string());
                    format!(
                        "same name ({first_name} {last_name}) as {other} and no number to tell them apart; \
                         assign distinct numbers if these are different athletes"
                    )
                }
            };
            if groups_differ {
                message.push_str("; age group is not part of identity, so different groups still collide");
            }
            DuplicateExplanation {
                strategy: IdentityStrategy::Composite,
                matched_on,
                missing,
                message,
            }
        }
    }
}

/// The issue a duplicate verdict raises on its row, if any.
///
/// Rejections are errors; every other resolution is a warning.
pub fn verdict_issue(verdict: &DuplicateVerdict, line: usize) -> Option<ImportIssue> {
    let kind = match verdict.status {
        DuplicateStatus::Unique => return None,
        DuplicateStatus::DuplicateInBatch => IssueKind::DuplicateInBatch,
        DuplicateStatus::DuplicateExisting => IssueKind::DuplicateExisting,
    };
    let message = verdict
        .explanation
        .as_ref()
        .map_or_else(|| kind.as_str().to_string(), |e| e.message.clone());
    let severity = if verdict.resolution == Some(Resolution::Reject) {
        IssueSeverity::Error
    } else {
        IssueSeverity::Warning
    };
    Some(
        ImportIssue::new(kind, message)
            .with_severity(severity)
            .at_row(line),
    )
}

#[cfg(test)]
mod tests {
    use roster_model::{CoercedValue, FieldValue};

    use super::*;
    use crate::identity::IdentityResolver;
    use crate::index::{EmptyIndex, InMemoryIdentityIndex};

    fn rows(names: &[(&str, &str, &str)]) -> Vec<ImportRow> {
        names
            .iter()
            .enumerate()
            .map(|(offset, (first, last, number))| {
                let mut row = ImportRow::new(offset + 2);
                for (key, value) in [("first_name", first), ("last_name", last), ("number", number)] {
                    if !value.is_empty() {
                        row.insert(key, FieldValue::ok(*value, CoercedValue::Text((*value).to_string())));
                    }
                }
                row
            })
            .collect()
    }

    fn identities(rows: &[ImportRow]) -> Vec<Option<RowIdentity>> {
        let resolver = IdentityResolver::default();
        rows.iter().map(|row| resolver.resolve(row)).collect()
    }

    #[test]
    fn same_name_without_number_names_the_missing_field() {
        let rows = rows(&[("John", "Smith", ""), ("john", "SMITH", "")]);
        let verdicts = DuplicateDetector::default().detect(&rows, &identities(&rows), &EmptyIndex);

        assert_eq!(verdicts[0].status, DuplicateStatus::Unique);
        assert_eq!(verdicts[1].status, DuplicateStatus::DuplicateInBatch);
        assert_eq!(verdicts[1].conflicts_with, Some(ConflictRef::Row(2)));
        assert_eq!(verdicts[1].resolution, Some(Resolution::Reject));
        let explanation = verdicts[1].explanation.as_ref().expect("explanation");
        assert_eq!(explanation.missing, vec!["number".to_string()]);
        assert!(explanation.message.contains("number"));

        let issue = verdict_issue(&verdicts[1], 3).expect("issue");
        assert_eq!(issue.severity, IssueSeverity::Error);
        assert_eq!(issue.kind, IssueKind::DuplicateInBatch);
    }

    #[test]
    fn distinct_numbers_are_not_duplicates() {
        let rows = rows(&[("John", "Smith", "4"), ("John", "Smith", "5")]);
        let verdicts = DuplicateDetector::default().detect(&rows, &identities(&rows), &EmptyIndex);
        assert!(verdicts.iter().all(|v| !v.is_duplicate()));
    }

    #[test]
    fn existing_records_follow_intent_policy() {
        let rows = rows(&[("Ann", "Lee", "12")]);
        let mut index = InMemoryIdentityIndex::new();
        index.insert("name:ann|lee|12".to_string(), "rec-1".to_string());

        let roster = DuplicateDetector::default().detect(&rows, &identities(&rows), &index);
        assert_eq!(roster[0].status, DuplicateStatus::DuplicateExisting);
        assert_eq!(roster[0].resolution, Some(Resolution::Skip));
        assert_eq!(
            roster[0].conflicts_with,
            Some(ConflictRef::Existing("rec-1".to_string()))
        );

        let scores = DuplicateDetector::new(DuplicatePolicy::for_intent(
            ImportIntent::ScoresOnly,
            BatchDuplicatePolicy::Reject,
            RosterDuplicatePolicy::Skip,
        ))
        .detect(&rows, &identities(&rows), &index);
        assert_eq!(scores[0].resolution, Some(Resolution::MergeScores));
        assert_eq!(
            verdict_issue(&scores[0], 2).map(|issue| issue.severity),
            Some(IssueSeverity::Warning)
        );
    }
}
