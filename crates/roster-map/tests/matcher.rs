use std::collections::BTreeSet;

use proptest::prelude::*;
use roster_map::{ColumnMatcher, MappingProposal, match_columns};
use roster_model::{ConfidenceLevel, MatchRule, SchemaField};
use roster_standards::{EventSchema, TemplateRegistry, roster_fields};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn render(proposal: &MappingProposal) -> String {
    let mut lines: Vec<String> = proposal
        .mappings
        .iter()
        .map(|m| {
            let target = m.target().unwrap_or("-");
            let rule = m.rule.map_or("-", |r| r.as_str());
            format!("{} -> {} [{}] {}", m.source_header, target, m.confidence, rule)
        })
        .collect();
    let unmapped = if proposal.unmapped_fields.is_empty() {
        "(none)".to_string()
    } else {
        proposal.unmapped_fields.join(", ")
    };
    lines.push(format!("unmapped fields: {unmapped}"));
    lines.join("\n")
}

fn exact_match_fields() -> Vec<SchemaField> {
    let mut fields: Vec<SchemaField> = roster_fields()
        .into_iter()
        .filter(|f| matches!(f.key.as_str(), "first_name" | "last_name" | "number"))
        .collect();
    fields.push(SchemaField::drill("40m_dash", "40M Dash").with_unit("sec"));
    fields
}

fn bench_press() -> SchemaField {
    SchemaField::drill("x7hG4kL9mN2pQ8vW", "Bench Press").with_unit("lbs")
}

#[test]
fn exact_match_scenario() {
    let proposal = ColumnMatcher::new(&exact_match_fields()).match_headers(&headers(&[
        "First Name",
        "Last Name",
        "Jersey Number",
        "40m Dash",
    ]));

    assert!(proposal.unmapped_headers().is_empty());
    assert!(proposal.mapped().all(|m| m.confidence >= ConfidenceLevel::Medium));
    insta::assert_snapshot!(render(&proposal), @r"
    First Name -> first_name [high] key
    Last Name -> last_name [high] key
    Jersey Number -> number [high] synonym
    40m Dash -> 40m_dash [high] key
    unmapped fields: (none)
    ");
}

#[test]
fn custom_drill_maps_by_label() {
    let mappings = match_columns(&headers(&["Bench Press"]), &[bench_press()]);
    let mapping = &mappings[0];
    assert_eq!(mapping.target(), Some("x7hG4kL9mN2pQ8vW"));
    assert_eq!(mapping.confidence, ConfidenceLevel::High);
    assert_eq!(mapping.rule, Some(MatchRule::SynonymExact));
}

#[test]
fn unit_suffixed_custom_drill_maps_aggressively() {
    let mappings = match_columns(&headers(&["Bench Press (lbs)"]), &[bench_press()]);
    let mapping = &mappings[0];
    assert_eq!(mapping.target(), Some("x7hG4kL9mN2pQ8vW"));
    assert_eq!(mapping.rule, Some(MatchRule::SynonymAggressive));
    assert_eq!(mapping.score, 85.0);
    assert_eq!(mapping.confidence, ConfidenceLevel::Medium);
}

#[test]
fn bracketed_variant_is_not_another_drill() {
    let cones = SchemaField::drill("agility_cones", "Agility (Cones)").with_unit("sec");
    let mappings = match_columns(&headers(&["Agility (Ladder)", "Agility (Cones) [sec]"]), &[cones]);
    assert_eq!(mappings[0].target(), None);
    assert_eq!(mappings[1].target(), Some("agility_cones"));
}

#[test]
fn near_miss_header_gets_hint_but_no_mapping() {
    let fields = vec![SchemaField::drill("shuttle", "Shuttle Run")];
    let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&["Shutle Rn"]));
    let mapping = &proposal.mappings[0];
    assert_eq!(mapping.target_key, None);
    assert_eq!(mapping.hint.as_deref(), Some("Shuttle Run"));
}

#[test]
fn every_builtin_field_matches_its_label_key_and_variant() {
    let registry = TemplateRegistry::builtin();
    for template in registry.iter() {
        let schema = EventSchema::assemble(template, vec![], &[]).expect("assemble");
        let matcher = ColumnMatcher::new(schema.fields());
        for field in schema.fields() {
            let variant = field.label.to_uppercase().replace(' ', "_");
            for header in [field.label.clone(), field.key.clone(), variant] {
                let proposal = matcher.match_headers(std::slice::from_ref(&header));
                let mapping = &proposal.mappings[0];
                assert_eq!(
                    mapping.target(),
                    Some(field.key.as_str()),
                    "{}: header '{header}'",
                    template.id
                );
                assert!(mapping.confidence >= ConfidenceLevel::Medium);
            }
        }
    }
}

#[test]
fn roster_aliases_resolve() {
    let fields = roster_fields();
    let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&[
        "FName", "Surname", "Jersey #", "Bib", "Division", "Pos",
    ]));
    let targets: Vec<_> = proposal.mappings.iter().map(|m| m.target()).collect();
    assert_eq!(
        targets,
        vec![
            Some("first_name"),
            Some("last_name"),
            Some("number"),
            Some("external_id"),
            Some("age_group"),
            Some("position"),
        ]
    );
}

#[test]
fn name_headers_prefer_the_specific_field() {
    let fields = roster_fields();
    let proposal = ColumnMatcher::new(&fields).match_headers(&headers(&[
        "Name", "First Name", "Team Name", "Athlete ID",
    ]));
    let targets: Vec<_> = proposal.mappings.iter().map(|m| m.target()).collect();
    assert_eq!(
        targets,
        vec![
            Some("full_name"),
            Some("first_name"),
            Some("team_name"),
            Some("external_id"),
        ]
    );
}

fn header_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z0-9 _#()%-]{0,18}", 0..6)
}

proptest! {
    #[test]
    fn matching_is_deterministic(headers in header_strategy()) {
        let schema = EventSchema::assemble(
            TemplateRegistry::builtin().get("football").expect("football"),
            vec![bench_press()],
            &[],
        )
        .expect("assemble");
        let matcher = ColumnMatcher::new(schema.fields());
        let first = matcher.match_headers(&headers);
        let second = matcher.match_headers(&headers);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.mappings.len(), headers.len());
    }

    #[test]
    fn targets_are_never_shared(headers in header_strategy()) {
        let fields = roster_fields();
        let proposal = ColumnMatcher::new(&fields).match_headers(&headers);
        let mut seen = BTreeSet::new();
        for mapping in proposal.mapped() {
            prop_assert!(seen.insert(mapping.target_key.clone()));
            prop_assert!(mapping.score > 0.0);
            prop_assert!(mapping.confidence > ConfidenceLevel::None);
        }
    }
}
