//! Near-miss hints for headers no rule could map.

use rapidfuzz::distance::jaro_winkler;

use roster_model::SchemaField;

use crate::normalize::normalize;

/// Minimum Jaro-Winkler similarity for a hint.
pub const HINT_SIMILARITY: f64 = 0.85;

/// Label of the field most similar to `header`, when similar enough.
///
/// Earlier fields win ties. Hints are suggestions for a reviewer and are never
/// turned into mappings.
pub fn closest_label(header: &str, fields: &[SchemaField]) -> Option<String> {
    let normalized = normalize(header);
    if normalized.is_empty() {
        return None;
    }
    let mut best: Option<(f64, &SchemaField)> = None;
    for field in fields {
        let label = normalize(&field.label);
        if label.is_empty() {
            continue;
        }
        let similarity = jaro_winkler::similarity(normalized.chars(), label.chars());
        if similarity >= HINT_SIMILARITY && best.is_none_or(|(current, _)| similarity > current) {
            best = Some((similarity, field));
        }
    }
    best.map(|(_, field)| field.label.clone())
}
