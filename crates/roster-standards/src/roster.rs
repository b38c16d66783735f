//! Built-in roster attributes shared by every event.

use roster_model::{SchemaField, ValueType};

pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const FULL_NAME: &str = "full_name";
pub const NUMBER: &str = "number";
pub const AGE_GROUP: &str = "age_group";
pub const EXTERNAL_ID: &str = "external_id";
pub const POSITION: &str = "position";
pub const TEAM_NAME: &str = "team_name";
pub const NOTES: &str = "notes";

/// Roster fields in display order.
pub fn roster_fields() -> Vec<SchemaField> {
    vec![
        SchemaField::roster(FIRST_NAME, "First Name")
            .required()
            .with_aliases(["first", "fname", "firstname", "given name", "player first name"]),
        SchemaField::roster(LAST_NAME, "Last Name")
            .required()
            .with_aliases(["last", "lname", "lastname", "surname", "family name", "player last name"]),
        SchemaField::roster(FULL_NAME, "Full Name")
            .covering([FIRST_NAME, LAST_NAME])
            .with_aliases(["name", "player name", "athlete name", "athlete", "student name"]),
        SchemaField::roster(NUMBER, "Number")
            .with_value_type(ValueType::Integer)
            .with_range(0.0, 9999.0)
            .with_aliases([
                "jersey",
                "jersey number",
                "jersey no",
                "no",
                "player number",
                "uniform number",
            ]),
        SchemaField::roster(AGE_GROUP, "Age Group").with_aliases([
            "age",
            "group",
            "division",
            "age division",
            "bracket",
        ]),
        SchemaField::roster(EXTERNAL_ID, "External ID").with_aliases([
            "bib",
            "bib number",
            "bib no",
            "athlete id",
            "player id",
        ]),
        SchemaField::roster(POSITION, "Position").with_aliases(["pos"]),
        SchemaField::roster(TEAM_NAME, "Team Name").with_aliases(["team"]),
        SchemaField::roster(NOTES, "Notes").with_aliases(["comments"]),
    ]
}

#[cfg(test)]
mod tests {
    use roster_model::validate_fields;

    use super::*;

    #[test]
    fn roster_fields_are_valid() {
        let fields = roster_fields();
        validate_fields(&fields).expect("roster fields validate");
        let required: Vec<_> = fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(required, vec![FIRST_NAME, LAST_NAME]);
    }

    #[test]
    fn full_name_stands_in_for_both_names() {
        let fields = roster_fields();
        let full = fields.iter().find(|f| f.key == FULL_NAME).expect("full name");
        assert!(!full.required);
        assert!(full.satisfies(FIRST_NAME));
        assert!(full.satisfies(LAST_NAME));
        assert!(!full.satisfies(NUMBER));
    }
}
