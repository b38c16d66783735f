//! Synonym generation.
//!
//! Synonyms are produced by an ordered list of variant rules. Each rule maps a
//! source string (the label, a human-readable key, or an alias) to one
//! variant; the results are unioned.

use std::collections::BTreeSet;

use roster_model::SchemaField;

/// A single label-to-variant transformation.
pub type VariantRule = fn(&str) -> String;

/// Variant rules in application order.
pub const VARIANT_RULES: &[(&str, VariantRule)] = &[
    ("verbatim", verbatim),
    ("no_space", no_space),
    ("underscored", underscored),
    ("hyphenated", hyphenated),
    ("space_collapsed", space_collapsed),
    ("punctuation_stripped", punctuation_stripped),
];

fn verbatim(text: &str) -> String {
    text.trim().to_string()
}

fn no_space(text: &str) -> String {
    text.split_whitespace().collect()
}

fn underscored(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

fn hyphenated(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("-")
}

fn space_collapsed(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn punctuation_stripped(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();
    space_collapsed(&kept)
}

/// Applies every variant rule to `source`, appending new non-empty results.
fn push_variants(source: &str, out: &mut Vec<String>) {
    for (_, rule) in VARIANT_RULES {
        let variant = rule(source);
        if !variant.is_empty() && !out.contains(&variant) {
            out.push(variant);
        }
    }
}

/// Synonyms for a field in generation order, without duplicates.
///
/// Order: label variants, the key, key variants (skipped for opaque keys),
/// then alias variants. A field with an empty label yields just its key.
pub fn synonym_list(field: &SchemaField) -> Vec<String> {
    let mut out = Vec::new();
    if field.label.trim().is_empty() {
        out.push(field.key.clone());
        return out;
    }
    push_variants(&field.label, &mut out);
    if field.has_opaque_key() {
        if !out.contains(&field.key) {
            out.push(field.key.clone());
        }
    } else {
        push_variants(&field.key, &mut out);
    }
    for alias in &field.aliases {
        push_variants(alias, &mut out);
    }
    out
}

/// The set of strings considered equivalent to `field`.
pub fn synonyms_for(field: &SchemaField) -> BTreeSet<String> {
    synonym_list(field).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_variants_are_generated() {
        let field = SchemaField::drill("40m_dash", "40-Yard Dash");
        let synonyms = synonyms_for(&field);
        for expected in [
            "40-Yard Dash",
            "40-YardDash",
            "40-Yard_Dash",
            "40Yard Dash",
            "40m_dash",
        ] {
            assert!(synonyms.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn opaque_key_gets_no_key_variants() {
        let field = SchemaField::drill("x7hG4kL9mN2pQ8vW", "Bench Press");
        let list = synonym_list(&field);
        assert_eq!(list[0], "Bench Press");
        assert!(list.contains(&"Bench_Press".to_string()));
        assert_eq!(
            list.iter().filter(|s| s.contains("x7hG")).count(),
            1,
            "only the raw key"
        );
    }

    #[test]
    fn empty_label_yields_key() {
        let field = SchemaField::drill("plank", "  ");
        assert_eq!(synonym_list(&field), vec!["plank".to_string()]);
    }

    #[test]
    fn aliases_contribute_variants() {
        let field = SchemaField::roster("number", "Number").with_aliases(["jersey number"]);
        let synonyms = synonyms_for(&field);
        assert!(synonyms.contains("jersey number"));
        assert!(synonyms.contains("jersey_number"));
    }

    #[test]
    fn synonym_generation_is_deterministic() {
        let field = SchemaField::drill("agility_cones", "Agility (Cones)");
        assert_eq!(synonym_list(&field), synonym_list(&field));
    }
}
