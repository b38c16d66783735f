//! Schema field definitions for importable roster attributes and drills.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Whether a field describes the athlete or a measured drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Roster,
    Drill,
}

/// Expected value type of a field after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Text,
    Integer,
    Number,
}

/// Advisory numeric bounds. Values outside the range are flagged, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}-{max}"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (None, None) => f.write_str("unbounded"),
        }
    }
}

/// One importable target column.
///
/// `key` is the stable identifier and is unique within a schema; `label` is
/// the display name and may repeat. Built-in fields use readable slugs as
/// keys, user-defined drills usually carry generated identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    #[serde(default)]
    pub lower_is_better: bool,
    /// Rows without a value for this field are rejected.
    #[serde(default)]
    pub required: bool,
    /// Overrides the type implied by `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Additional header spellings known to mean this field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Required fields whose column this field can stand in for, such as a
    /// single name column that splits into first and last name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub covers: Vec<String>,
}

impl SchemaField {
    pub fn roster(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Roster)
    }

    pub fn drill(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Drill)
    }

    fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            unit: None,
            range: None,
            lower_is_better: false,
            required: false,
            value_type: None,
            aliases: Vec::new(),
            covers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(ValueRange::new(min, max));
        self
    }

    #[must_use]
    pub fn lower_is_better(mut self) -> Self {
        self.lower_is_better = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn covering<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.covers.extend(keys.into_iter().map(Into::into));
        self
    }

    /// True when a column mapped to this field satisfies `key`.
    pub fn satisfies(&self, key: &str) -> bool {
        self.key == key || self.covers.iter().any(|covered| covered == key)
    }

    pub fn is_drill(&self) -> bool {
        self.kind == FieldKind::Drill
    }

    /// Effective value type: the explicit override, else numbers for drills
    /// and text for roster attributes.
    pub fn value_type(&self) -> ValueType {
        self.value_type.unwrap_or(match self.kind {
            FieldKind::Drill => ValueType::Number,
            FieldKind::Roster => ValueType::Text,
        })
    }

    /// True when the key looks machine-generated rather than human-typed.
    ///
    /// Generated keys are long, purely alphanumeric, and mix digits with
    /// both letter cases (e.g. `x7hG4kL9mN2pQ8vW`). Nobody writes such a
    /// key as a column header, so matching relies on the label instead.
    pub fn has_opaque_key(&self) -> bool {
        let key = self.key.as_str();
        if key.len() < 12 || !key.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return false;
        }
        let has_digit = key.chars().any(|ch| ch.is_ascii_digit());
        let has_upper = key.chars().any(|ch| ch.is_ascii_uppercase());
        let has_lower = key.chars().any(|ch| ch.is_ascii_lowercase());
        has_digit && has_upper && has_lower
    }
}

/// Checks schema-level invariants: non-empty unique keys and sane ranges.
pub fn validate_fields(fields: &[SchemaField]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for field in fields {
        if field.key.trim().is_empty() {
            return Err(ModelError::EmptyKey {
                label: field.label.clone(),
            });
        }
        if !seen.insert(field.key.as_str()) {
            return Err(ModelError::DuplicateKey {
                key: field.key.clone(),
            });
        }
        if let Some(ValueRange {
            min: Some(min),
            max: Some(max),
        }) = field.range
            && min > max
        {
            return Err(ModelError::InvalidRange {
                key: field.key.clone(),
                min,
                max,
            });
        }
    }
    Ok(())
}

/// Finds a field by its exact key.
pub fn find_field<'a>(fields: &'a [SchemaField], key: &str) -> Option<&'a SchemaField> {
    fields.iter().find(|field| field.key == key)
}
