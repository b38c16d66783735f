//! Event schema assembly and loading.
//!
//! An event's importable fields are the built-in roster fields, followed by
//! the drills of its sport template that were not disabled, followed by the
//! event's custom drills. Custom drills are never filtered by the disabled
//! list.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use roster_model::{SchemaField, ValueRange, ValueType, validate_fields};

use crate::error::{Result, StandardsError};
use crate::registry::TemplateRegistry;
use crate::roster::roster_fields;
use crate::templates::SportTemplate;

/// The ordered fields an import is reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub fields: Vec<SchemaField>,
}

impl EventSchema {
    /// Builds a schema from explicit fields, checking key uniqueness.
    pub fn from_fields(fields: Vec<SchemaField>) -> Result<Self> {
        check_unique(&fields)?;
        validate_fields(&fields)?;
        Ok(Self {
            template_id: None,
            fields,
        })
    }

    /// Roster fields, then the template's enabled drills, then custom drills.
    pub fn assemble(
        template: &SportTemplate,
        custom_drills: Vec<SchemaField>,
        disabled: &[String],
    ) -> Result<Self> {
        let disabled: BTreeSet<&str> = disabled.iter().map(String::as_str).collect();
        let mut fields = roster_fields();
        fields.extend(
            template
                .drills
                .iter()
                .filter(|drill| !disabled.contains(drill.key.as_str()))
                .cloned(),
        );
        fields.extend(custom_drills);
        let mut schema = Self::from_fields(fields)?;
        schema.template_id = Some(template.id.clone());
        Ok(schema)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<SchemaField> {
        self.fields
    }

    pub fn field(&self, key: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    pub fn drills(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|field| field.is_drill())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|field| field.required)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn check_unique(fields: &[SchemaField]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for field in fields {
        if !seen.insert(field.key.as_str()) {
            return Err(StandardsError::DuplicateKey {
                key: field.key.clone(),
            });
        }
    }
    Ok(())
}

/// A user-defined drill as written in an event schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDrillDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub lower_is_better: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CustomDrillDef {
    pub fn to_field(&self) -> SchemaField {
        let mut field = SchemaField::drill(&self.key, &self.label).with_aliases(self.aliases.clone());
        field.unit = self.unit.clone();
        field.lower_is_better = self.lower_is_better;
        if self.min.is_some() || self.max.is_some() {
            field.range = Some(ValueRange {
                min: self.min,
                max: self.max,
            });
        }
        field
    }
}

/// An additional roster attribute defined by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterFieldDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub numeric: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RosterFieldDef {
    pub fn to_field(&self) -> SchemaField {
        let mut field =
            SchemaField::roster(&self.key, &self.label).with_aliases(self.aliases.clone());
        field.required = self.required;
        if self.numeric {
            field.value_type = Some(ValueType::Number);
        }
        field
    }
}

/// Event schema as written in a TOML or JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSchemaDef {
    /// Template id or sport name.
    pub template: Option<String>,
    pub custom_drills: Vec<CustomDrillDef>,
    pub disabled_drills: Vec<String>,
    pub extra_roster_fields: Vec<RosterFieldDef>,
}

impl EventSchemaDef {
    /// Resolves the definition against a template registry.
    ///
    /// Without a template the registry fallback is used.
    pub fn resolve(&self, registry: &TemplateRegistry) -> Result<EventSchema> {
        let template = match &self.template {
            Some(name) => registry.get(name)?,
            None => registry
                .fallback()
                .ok_or_else(|| StandardsError::UnknownTemplate {
                    name: "<default>".to_string(),
                })?,
        };
        let customs = self.custom_drills.iter().map(CustomDrillDef::to_field).collect();
        let mut schema = EventSchema::assemble(template, customs, &self.disabled_drills)?;
        if !self.extra_roster_fields.is_empty() {
            let drills_start = schema
                .fields
                .iter()
                .position(SchemaField::is_drill)
                .unwrap_or(schema.fields.len());
            let extras = self.extra_roster_fields.iter().map(RosterFieldDef::to_field);
            schema.fields.splice(drills_start..drills_start, extras);
            check_unique(&schema.fields)?;
        }
        Ok(schema)
    }

    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| StandardsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(contents: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| StandardsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads an event schema definition, choosing the format by extension.
pub fn load_event_schema_def(path: &Path) -> Result<EventSchemaDef> {
    let contents = fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("toml") => EventSchemaDef::from_toml_str(&contents, path),
        Some("json") => EventSchemaDef::from_json_str(&contents, path),
        _ => Err(StandardsError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Loads and resolves an event schema file against the built-in templates.
pub fn load_event_schema(path: &Path) -> Result<EventSchema> {
    load_event_schema_def(path)?.resolve(&TemplateRegistry::builtin())
}

#[cfg(test)]
mod tests {
    use crate::templates::football;

    use super::*;

    #[test]
    fn assemble_orders_roster_template_custom() {
        let custom = SchemaField::drill("x7hG4kL9mN2pQ8vW", "Bench Press").with_unit("lbs");
        let schema = EventSchema::assemble(
            &football(),
            vec![custom],
            &["catching".to_string(), "x7hG4kL9mN2pQ8vW".to_string()],
        )
        .expect("assemble");
        let keys: Vec<_> = schema.drills().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "40m_dash",
                "vertical_jump",
                "throwing",
                "agility",
                "x7hG4kL9mN2pQ8vW"
            ]
        );
        assert_eq!(schema.fields[0].key, "first_name");
        assert_eq!(schema.template_id.as_deref(), Some("football"));
    }

    #[test]
    fn assemble_rejects_custom_key_collision() {
        let custom = SchemaField::drill("agility", "Agility Ladder");
        let err = EventSchema::assemble(&football(), vec![custom], &[]).unwrap_err();
        assert!(matches!(err, StandardsError::DuplicateKey { key } if key == "agility"));
    }
}
