//! Column matching engine.
//!
//! Every header is scored against every schema field with a fixed ladder of
//! rules; the single best-scoring field wins. Ties are never guessed: a header
//! whose best score is shared by two fields stays unmapped, and so does a
//! header that loses a target to a stronger header.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use roster_model::{
    ColumnMapping, ConfidenceLevel, ImportIssue, IssueKind, MappingConflict, MatchRule,
    SchemaField,
};

use crate::hints::closest_label;
use crate::normalize::{normalize, normalize_aggressive};
use crate::synonyms::synonym_list;

const SCORE_EPSILON: f64 = 1e-9;

const SCORE_KEY_EXACT: f64 = 100.0;
const SCORE_KEY_AGGRESSIVE: f64 = 95.0;
const SCORE_SYNONYM_EXACT: f64 = 90.0;
const SCORE_SYNONYM_AGGRESSIVE: f64 = 85.0;
const CONTAINED_BASE: f64 = 50.0;
const CONTAINED_SPAN: f64 = 30.0;
const CONTAINED_AGGRESSIVE_BASE: f64 = 40.0;
const CONTAINED_AGGRESSIVE_SPAN: f64 = 20.0;

/// Synonyms shorter than this never match aggressively or by containment.
const MIN_AGGRESSIVE_SYNONYM: usize = 3;
const MIN_CONTAINED_SYNONYM: usize = 3;
const MIN_CONTAINED_AGGRESSIVE_SYNONYM: usize = 4;

/// Score boundaries between confidence tiers.
///
/// - `score >= high`: [`ConfidenceLevel::High`]
/// - `medium <= score < high`: [`ConfidenceLevel::Medium`]
/// - any other positive score: [`ConfidenceLevel::Low`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Minimum score for high confidence (default: 90).
    pub high: f64,
    /// Minimum score for medium confidence (default: 70).
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 90.0,
            medium: 70.0,
        }
    }
}

impl ConfidenceThresholds {
    #[must_use]
    pub fn categorize(&self, score: f64) -> ConfidenceLevel {
        if score >= self.high {
            ConfidenceLevel::High
        } else if score >= self.medium {
            ConfidenceLevel::Medium
        } else if score > 0.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::None
        }
    }
}

/// Output of [`ColumnMatcher::match_headers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingProposal {
    /// One entry per header, in header order.
    pub mappings: Vec<ColumnMapping>,
    /// Schema keys that no header maps to, in schema order.
    pub unmapped_fields: Vec<String>,
}

impl MappingProposal {
    pub fn mapped(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.mappings.iter().filter(|m| m.is_mapped())
    }

    pub fn unmapped_headers(&self) -> Vec<&str> {
        self.mappings
            .iter()
            .filter(|m| !m.is_mapped())
            .map(|m| m.source_header.as_str())
            .collect()
    }

    pub fn target_for(&self, header: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.source_header == header)
            .and_then(ColumnMapping::target)
    }

    pub fn header_for(&self, target_key: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.target() == Some(target_key))
            .map(|m| m.source_header.as_str())
    }

    /// Returns the count of mapped headers at each confidence level.
    #[must_use]
    pub fn count_by_level(&self) -> BTreeMap<ConfidenceLevel, usize> {
        let mut counts = BTreeMap::new();
        for mapping in self.mapped() {
            *counts.entry(mapping.confidence).or_insert(0) += 1;
        }
        counts
    }

    /// Mappings at or above `min_level`.
    #[must_use]
    pub fn filter_by_level(&self, min_level: ConfidenceLevel) -> Vec<&ColumnMapping> {
        self.mapped()
            .filter(|m| m.confidence >= min_level)
            .collect()
    }

    #[must_use]
    pub fn all_high_confidence(&self) -> bool {
        !self.mappings.is_empty()
            && self
                .mappings
                .iter()
                .all(|m| m.confidence == ConfidenceLevel::High)
    }

    /// One `AmbiguousMapping` issue per header left unmapped by a conflict.
    pub fn ambiguity_issues(&self) -> Vec<ImportIssue> {
        self.mappings
            .iter()
            .filter_map(|m| {
                m.conflict.as_ref().map(|conflict| {
                    ImportIssue::new(
                        IssueKind::AmbiguousMapping,
                        format!("column '{}' left unmapped: {conflict}", m.source_header),
                    )
                    .for_column(&m.source_header)
                })
            })
            .collect()
    }
}

/// Precomputed comparable forms of one synonym.
#[derive(Debug, Clone)]
struct SynonymForms {
    standard: String,
    standard_len: usize,
    aggressive: String,
    aggressive_len: usize,
}

impl SynonymForms {
    fn new(raw: &str) -> Self {
        let standard = normalize(raw);
        let aggressive = normalize_aggressive(raw);
        Self {
            standard_len: standard.chars().count(),
            aggressive_len: aggressive.chars().count(),
            standard,
            aggressive,
        }
    }
}

#[derive(Debug, Clone)]
struct FieldProfile {
    key_standard: String,
    key_aggressive: String,
    synonyms: Vec<SynonymForms>,
}

impl FieldProfile {
    fn new(field: &SchemaField) -> Self {
        let mut synonyms: Vec<SynonymForms> = Vec::new();
        for raw in synonym_list(field) {
            let forms = SynonymForms::new(&raw);
            if !synonyms
                .iter()
                .any(|s| s.standard == forms.standard && s.aggressive == forms.aggressive)
            {
                synonyms.push(forms);
            }
        }
        Self {
            key_standard: normalize(&field.key),
            key_aggressive: normalize_aggressive(&field.key),
            synonyms,
        }
    }
}

/// A header in both normalized forms.
struct HeaderForms {
    standard: String,
    standard_len: usize,
    aggressive: String,
    aggressive_len: usize,
}

impl HeaderForms {
    fn new(raw: &str) -> Self {
        let standard = normalize(raw);
        let aggressive = normalize_aggressive(raw);
        Self {
            standard_len: standard.chars().count(),
            aggressive_len: aggressive.chars().count(),
            standard,
            aggressive,
        }
    }
}

/// Scores spreadsheet headers against a schema.
///
/// # Example
///
/// ```ignore
/// use roster_map::ColumnMatcher;
///
/// let matcher = ColumnMatcher::new(&schema_fields);
/// let proposal = matcher.match_headers(&["First Name".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnMatcher {
    fields: Vec<SchemaField>,
    profiles: Vec<FieldProfile>,
    thresholds: ConfidenceThresholds,
    allow_shared_targets: bool,
}

impl ColumnMatcher {
    pub fn new(fields: &[SchemaField]) -> Self {
        Self {
            profiles: fields.iter().map(FieldProfile::new).collect(),
            fields: fields.to_vec(),
            thresholds: ConfidenceThresholds::default(),
            allow_shared_targets: false,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Lets several headers map to the same field.
    #[must_use]
    pub fn allow_shared_targets(mut self, allow: bool) -> Self {
        self.allow_shared_targets = allow;
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    /// Best rule score of one header against one field, if any rule applies.
    pub fn score(&self, header: &str, field_index: usize) -> Option<(f64, MatchRule)> {
        let profile = self.profiles.get(field_index)?;
        score_forms(&HeaderForms::new(header), profile)
    }

    /// Proposes a mapping for every header.
    pub fn match_headers(&self, headers: &[String]) -> MappingProposal {
        let _span = debug_span!(
            "column_match",
            headers = headers.len(),
            fields = self.fields.len()
        )
        .entered();

        let mut mappings: Vec<ColumnMapping> = headers
            .iter()
            .enumerate()
            .map(|(index, header)| self.best_for(header, index))
            .collect();

        if !self.allow_shared_targets {
            resolve_shared_targets(&mut mappings);
        }

        for mapping in &mut mappings {
            if !mapping.is_mapped() && mapping.conflict.is_none() {
                mapping.hint = closest_label(&mapping.source_header, &self.fields);
            }
        }

        let unmapped_fields = self
            .fields
            .iter()
            .filter(|field| !mappings.iter().any(|m| m.target() == Some(field.key.as_str())))
            .map(|field| field.key.clone())
            .collect();

        MappingProposal {
            mappings,
            unmapped_fields,
        }
    }

    fn best_for(&self, header: &str, index: usize) -> ColumnMapping {
        let forms = HeaderForms::new(header);
        let scored: Vec<(usize, f64, MatchRule)> = self
            .profiles
            .iter()
            .enumerate()
            .filter_map(|(field_index, profile)| {
                score_forms(&forms, profile).map(|(score, rule)| (field_index, score, rule))
            })
            .collect();

        let mut mapping = ColumnMapping::unmapped(header, index);
        let Some(best) = scored.iter().map(|(_, score, _)| *score).reduce(f64::max) else {
            debug!(header, "no candidate field");
            return mapping;
        };
        let tied: Vec<&(usize, f64, MatchRule)> = scored
            .iter()
            .filter(|(_, score, _)| (best - score).abs() < SCORE_EPSILON)
            .collect();

        mapping.score = best;
        if let [(field_index, _, rule)] = tied.as_slice() {
            let key = &self.fields[*field_index].key;
            mapping.target_key = Some(key.clone());
            mapping.rule = Some(*rule);
            mapping.confidence = self.thresholds.categorize(best);
            debug!(header, target = %key, score = best, "column mapped");
        } else {
            let candidates: Vec<String> = tied
                .iter()
                .map(|(field_index, _, _)| self.fields[*field_index].key.clone())
                .collect();
            debug!(header, score = best, candidates = ?candidates, "tied candidates");
            mapping.conflict = Some(MappingConflict::TiedFields { candidates });
        }
        mapping
    }
}

fn score_forms(header: &HeaderForms, profile: &FieldProfile) -> Option<(f64, MatchRule)> {
    let mut best: Option<(f64, MatchRule)> = None;
    let mut consider = |score: f64, rule: MatchRule| {
        if best.is_none_or(|(current, _)| score > current + SCORE_EPSILON) {
            best = Some((score, rule));
        }
    };

    if !header.standard.is_empty() && header.standard == profile.key_standard {
        consider(SCORE_KEY_EXACT, MatchRule::KeyExact);
    }
    if !header.aggressive.is_empty() && header.aggressive == profile.key_aggressive {
        consider(SCORE_KEY_AGGRESSIVE, MatchRule::KeyAggressive);
    }
    for synonym in &profile.synonyms {
        if !header.standard.is_empty() && header.standard == synonym.standard {
            consider(SCORE_SYNONYM_EXACT, MatchRule::SynonymExact);
        }
        if synonym.aggressive_len >= MIN_AGGRESSIVE_SYNONYM
            && header.aggressive == synonym.aggressive
        {
            consider(SCORE_SYNONYM_AGGRESSIVE, MatchRule::SynonymAggressive);
        }
        if synonym.standard_len >= MIN_CONTAINED_SYNONYM
            && header.standard_len > 0
            && header.standard.contains(&synonym.standard)
        {
            let ratio = synonym.standard_len as f64 / header.standard_len as f64;
            consider(
                CONTAINED_BASE + CONTAINED_SPAN * ratio,
                MatchRule::SynonymContained,
            );
        }
        if synonym.aggressive_len >= MIN_CONTAINED_AGGRESSIVE_SYNONYM
            && header.aggressive_len > 0
            && header.aggressive.contains(&synonym.aggressive)
        {
            let ratio = synonym.aggressive_len as f64 / header.aggressive_len as f64;
            consider(
                CONTAINED_AGGRESSIVE_BASE + CONTAINED_AGGRESSIVE_SPAN * ratio,
                MatchRule::SynonymContainedAggressive,
            );
        }
    }
    best
}

/// Leaves only the strongest header on each target.
///
/// Losers become unmapped with a [`MappingConflict::SharedTarget`]; when the
/// strongest score itself is shared, every claimant is unmapped.
fn resolve_shared_targets(mappings: &mut [ColumnMapping]) {
    let mut claims: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, mapping) in mappings.iter().enumerate() {
        if let Some(target) = mapping.target() {
            claims.entry(target.to_string()).or_default().push(position);
        }
    }

    for (target, positions) in claims {
        if positions.len() < 2 {
            continue;
        }
        let best = positions
            .iter()
            .map(|&p| mappings[p].score)
            .fold(f64::MIN, f64::max);
        let winners: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&p| (best - mappings[p].score).abs() < SCORE_EPSILON)
            .collect();
        let keep = if winners.len() == 1 {
            Some(winners[0])
        } else {
            None
        };

        let headers: Vec<(usize, String)> = positions
            .iter()
            .map(|&p| (p, mappings[p].source_header.clone()))
            .collect();
        for &position in &positions {
            if Some(position) == keep {
                continue;
            }
            let competing_headers = match keep {
                Some(winner) => vec![mappings[winner].source_header.clone()],
                None => headers
                    .iter()
                    .filter(|(p, _)| *p != position)
                    .map(|(_, header)| header.clone())
                    .collect(),
            };
            let mapping = &mut mappings[position];
            debug!(
                header = %mapping.source_header,
                target = %target,
                "target claimed by another header"
            );
            mapping.target_key = None;
            mapping.confidence = ConfidenceLevel::None;
            mapping.conflict = Some(MappingConflict::SharedTarget {
                target_key: target.clone(),
                competing_headers,
            });
        }
    }
}

/// Maps `headers` against `fields` with default settings.
pub fn match_columns(headers: &[String], fields: &[SchemaField]) -> Vec<ColumnMapping> {
    ColumnMatcher::new(fields).match_headers(headers).mappings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn thresholds_categorize() {
        let t = ConfidenceThresholds::default();
        assert_eq!(t.categorize(100.0), ConfidenceLevel::High);
        assert_eq!(t.categorize(90.0), ConfidenceLevel::High);
        assert_eq!(t.categorize(85.0), ConfidenceLevel::Medium);
        assert_eq!(t.categorize(56.0), ConfidenceLevel::Low);
        assert_eq!(t.categorize(0.0), ConfidenceLevel::None);
    }

    #[test]
    fn rule_ladder_scores() {
        let fields = vec![SchemaField::drill("vertical_jump", "Vertical Jump")];
        let matcher = ColumnMatcher::new(&fields);
        assert_eq!(matcher.score("Vertical_Jump", 0), Some((100.0, MatchRule::KeyExact)));
        assert_eq!(
            matcher.score("VerticalJump", 0),
            Some((95.0, MatchRule::KeyAggressive))
        );
        let (score, rule) = matcher.score("Best Vertical Jump Result", 0).expect("contained");
        assert_eq!(rule, MatchRule::SynonymContained);
        assert!((score - (50.0 + 30.0 * 13.0 / 25.0)).abs() < 1e-9);
        assert_eq!(matcher.score("Broad Jump", 0), None);
    }

    #[test]
    fn short_synonyms_do_not_match_by_containment() {
        let fields = vec![SchemaField::roster("number", "Number").with_aliases(["no"])];
        let matcher = ColumnMatcher::new(&fields);
        assert_eq!(matcher.score("No", 0), Some((90.0, MatchRule::SynonymExact)));
        assert_eq!(matcher.score("Notes", 0), None);
    }

    #[test]
    fn tied_fields_stay_unmapped() {
        let fields = vec![
            SchemaField::drill("sprint_a", "Sprint"),
            SchemaField::drill("sprint_b", "Sprint"),
        ];
        let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&["Sprint"]));
        let mapping = &proposal.mappings[0];
        assert_eq!(mapping.target_key, None);
        assert_eq!(mapping.confidence, ConfidenceLevel::None);
        assert_eq!(
            mapping.conflict,
            Some(MappingConflict::TiedFields {
                candidates: vec!["sprint_a".to_string(), "sprint_b".to_string()]
            })
        );
        assert_eq!(proposal.ambiguity_issues().len(), 1);
    }

    #[test]
    fn weaker_header_loses_shared_target() {
        let fields = vec![SchemaField::roster("last_name", "Last Name").with_aliases(["last"])];
        let proposal =
            ColumnMatcher::new(&fields).match_headers(&headers(&["Last", "Last Name"]));
        assert_eq!(proposal.target_for("Last Name"), Some("last_name"));
        assert_eq!(proposal.target_for("Last"), None);
        assert!(matches!(
            &proposal.mappings[0].conflict,
            Some(MappingConflict::SharedTarget { competing_headers, .. })
                if competing_headers == &vec!["Last Name".to_string()]
        ));
    }

    #[test]
    fn equal_claims_unmap_every_claimant() {
        let fields = vec![SchemaField::drill("agility", "Agility")];
        let proposal =
            ColumnMatcher::new(&fields).match_headers(&headers(&["Agility", "agility"]));
        assert!(proposal.mapped().next().is_none());
        assert_eq!(proposal.unmapped_fields, vec!["agility".to_string()]);
    }

    #[test]
    fn shared_targets_allowed_by_policy() {
        let fields = vec![SchemaField::drill("agility", "Agility")];
        let proposal = ColumnMatcher::new(&fields)
            .allow_shared_targets(true)
            .match_headers(&headers(&["Agility", "Agility Score"]));
        assert_eq!(proposal.mapped().count(), 2);
    }

    #[test]
    fn unrecognized_header_is_not_mapped_to_itself() {
        let fields = vec![SchemaField::drill("agility", "Agility")];
        let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&["Shoe Size"]));
        assert_eq!(proposal.mappings[0].target_key, None);
        assert_eq!(proposal.mappings[0].score, 0.0);
    }

    #[test]
    fn empty_header_never_matches() {
        let fields = vec![SchemaField::drill("agility", "Agility")];
        let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&["", "  ", "()"]));
        assert!(proposal.mapped().next().is_none());
    }
}
