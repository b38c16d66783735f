//! Parsed spreadsheet and mapped row types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Source line of the first data row; the header occupies line 1.
pub const FIRST_DATA_LINE: usize = 2;

/// One data row exactly as read from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    /// 1-based source line.
    pub line: usize,
    /// Cells in header order. Always the same length as the header list.
    pub cells: Vec<String>,
}

/// A sheet after file decoding: headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl ParsedSheet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating its cells to the header width.
    pub fn push_row(&mut self, line: usize, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(SheetRow { line, cells });
    }

    /// Builds a sheet from keyed records.
    ///
    /// Records are numbered from line 2 in order; missing keys become empty
    /// cells.
    pub fn from_records(headers: Vec<String>, records: &[BTreeMap<String, String>]) -> Self {
        let mut sheet = Self::new(headers);
        for (offset, record) in records.iter().enumerate() {
            let cells = sheet
                .headers
                .iter()
                .map(|header| record.get(header).cloned().unwrap_or_default())
                .collect();
            sheet.push_row(FIRST_DATA_LINE + offset, cells);
        }
        sheet
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A value coerced to its field's expected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoercedValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CoercedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for CoercedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Tagged cell value: the raw text, and either a coerced value or the reason
/// coercion failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub raw: String,
    pub coerced: Option<CoercedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coercion_error: Option<String>,
}

impl FieldValue {
    pub fn ok(raw: impl Into<String>, coerced: CoercedValue) -> Self {
        Self {
            raw: raw.into(),
            coerced: Some(coerced),
            coercion_error: None,
        }
    }

    pub fn failed(raw: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            coerced: None,
            coercion_error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.coerced.is_some()
    }
}

/// A data row after mapping: field key to value, plus its source line.
///
/// Empty cells are absent rather than present with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub line: usize,
    pub values: BTreeMap<String, FieldValue>,
}

impl ImportRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Coerced text of a field, if present and valid.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|value| value.coerced.as_ref())
            .and_then(CoercedValue::as_text)
    }

    /// Raw text of a field regardless of coercion outcome.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|value| value.raw.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }
}
