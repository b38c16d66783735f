//! Reshaping sheet rows into field values and checking them.

use tracing::debug;

use roster_model::{CoercedValue, FieldValue, ImportIssue, ImportRow, IssueKind, SchemaField, SheetRow};

use crate::value::coerce;

/// One mapped column: its index in the sheet and the field it feeds.
#[derive(Debug, Clone, Copy)]
pub struct MappedColumn<'a> {
    pub index: usize,
    pub header: &'a str,
    pub field: &'a SchemaField,
}

/// Turns a sheet row into an [`ImportRow`].
///
/// Empty cells are skipped. When several columns feed one field the first
/// non-empty one wins. Malformed values stay in the row as failed
/// [`roster_model::FieldValue`]s and raise a warning; numbers outside a
/// field's advisory range raise a warning but are kept.
pub fn shape_row(row: &SheetRow, columns: &[MappedColumn<'_>]) -> (ImportRow, Vec<ImportIssue>) {
    let mut shaped = ImportRow::new(row.line);
    let mut issues = Vec::new();

    for column in columns {
        let Some(cell) = row.cells.get(column.index).map(|cell| cell.trim()) else {
            continue;
        };
        if cell.is_empty() || shaped.get(&column.field.key).is_some() {
            continue;
        }
        let value = coerce(cell, column.field.value_type());

        if let Some(error) = &value.coercion_error {
            debug!(row = row.line, field = %column.field.key, "malformed value");
            issues.push(
                ImportIssue::new(
                    IssueKind::MalformedValue,
                    format!("{}: {error}; value ignored", column.field.label),
                )
                .at_row(row.line)
                .for_field(&column.field.key)
                .for_column(column.header),
            );
        } else if let (Some(range), Some(number)) = (
            column.field.range,
            value.coerced.as_ref().and_then(|coerced| coerced.as_f64()),
        ) && !range.contains(number)
        {
            issues.push(
                ImportIssue::new(
                    IssueKind::OutOfRangeValue,
                    format!(
                        "{} value {number} is outside the expected range {range}",
                        column.field.label
                    ),
                )
                .at_row(row.line)
                .for_field(&column.field.key)
                .for_column(column.header),
            );
        }
        shaped.insert(column.field.key.clone(), value);
    }
    (shaped, issues)
}

/// Keys involved in splitting a single name column.
#[derive(Debug, Clone, Copy)]
pub struct NameKeys<'k> {
    pub full: &'k str,
    pub first: &'k str,
    pub last: &'k str,
}

/// Fills first and last name from a full-name value.
///
/// `Lee, Ann` splits at the comma, otherwise the last word is the last
/// name. A name that already has its own column is never replaced, and a
/// single word fills nothing.
pub fn split_full_name(row: &mut ImportRow, keys: NameKeys<'_>) {
    let Some(full) = row.raw(keys.full).map(str::trim).filter(|full| !full.is_empty()) else {
        return;
    };
    let (first, last) = match full.split_once(',') {
        Some((last, first)) => (first.trim().to_string(), last.trim().to_string()),
        None => match full.rsplit_once(char::is_whitespace) {
            Some((first, last)) => (first.trim().to_string(), last.trim().to_string()),
            None => return,
        },
    };
    for (key, value) in [(keys.first, first), (keys.last, last)] {
        if value.is_empty() || row.get(key).is_some() {
            continue;
        }
        debug!(row = row.line, field = key, "name taken from full name");
        row.insert(key, FieldValue::ok(value.clone(), CoercedValue::Text(value)));
    }
}

/// Errors for required fields that are absent or failed coercion.
pub fn missing_required(row: &ImportRow, required: &[&SchemaField]) -> Vec<ImportIssue> {
    required
        .iter()
        .filter(|field| !row.get(&field.key).is_some_and(|value| value.is_valid()))
        .map(|field| {
            ImportIssue::new(
                IssueKind::MissingRequiredValue,
                format!("{} is required", field.label),
            )
            .at_row(row.line)
            .for_field(&field.key)
        })
        .collect()
}
