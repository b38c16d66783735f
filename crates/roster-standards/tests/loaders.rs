use std::fs;

use roster_model::FieldKind;
use roster_standards::{StandardsError, load_event_schema, load_event_schema_def};

#[test]
fn loads_toml_event_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("event.toml");
    fs::write(
        &path,
        r#"
template = "Basketball"
disabled_drills = ["dribbling", "defensive_slide"]

[[custom_drills]]
key = "x7hG4kL9mN2pQ8vW"
label = "Bench Press"
unit = "lbs"
min = 0
max = 600

[[extra_roster_fields]]
key = "school"
label = "School"
aliases = ["high school"]
"#,
    )
    .expect("write schema");

    let schema = load_event_schema(&path).expect("load schema");
    assert_eq!(schema.template_id.as_deref(), Some("basketball"));
    assert!(!schema.contains_key("dribbling"));
    let bench = schema.field("x7hG4kL9mN2pQ8vW").expect("custom drill");
    assert_eq!(bench.kind, FieldKind::Drill);
    assert!(bench.range.is_some_and(|r| r.contains(225.0)));

    let school_pos = schema.fields.iter().position(|f| f.key == "school");
    let first_drill = schema.fields.iter().position(|f| f.is_drill());
    assert!(school_pos < first_drill);
}

#[test]
fn loads_json_event_schema_with_default_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("event.json");
    fs::write(&path, r#"{"custom_drills": [{"key": "plank", "label": "Plank Hold"}]}"#)
        .expect("write schema");

    let def = load_event_schema_def(&path).expect("load def");
    assert!(def.template.is_none());
    let schema = load_event_schema(&path).expect("load schema");
    assert_eq!(schema.template_id.as_deref(), Some("football"));
    assert!(schema.contains_key("plank"));
}

#[test]
fn rejects_unknown_extension_and_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml = dir.path().join("event.yaml");
    fs::write(&yaml, "template: football").expect("write");
    assert!(matches!(
        load_event_schema(&yaml),
        Err(StandardsError::UnsupportedFormat { .. })
    ));

    let toml = dir.path().join("event.toml");
    fs::write(&toml, "template = \"curling\"").expect("write");
    assert!(matches!(
        load_event_schema(&toml),
        Err(StandardsError::UnknownTemplate { .. })
    ));
}
