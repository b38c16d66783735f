//! Spreadsheet workbooks (xlsx, xlsm, xls, xlsb, ods) via calamine.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::sheet::{IngestedSheet, SheetBuilder};

/// File extensions read as workbooks.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

fn workbook_error(path: &Path, err: impl std::fmt::Display) -> IngestError {
    IngestError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

/// Names of the worksheets in a workbook, in workbook order.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    Ok(workbook.sheet_names().clone())
}

/// Reads one worksheet. The first sheet is used when `sheet` is `None`;
/// names are compared ignoring case.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<IngestedSheet> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    let names = workbook.sheet_names().clone();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| IngestError::SheetNotFound {
                name: wanted.to_string(),
                available: names.clone(),
            })?,
        None => names.first().cloned().ok_or_else(|| IngestError::EmptySheet {
            source_name: path.display().to_string(),
        })?,
    };
    info!(sheet = %name, sheets = names.len(), "reading worksheet");

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| workbook_error(path, e))?;
    let first_line = range.start().map_or(1, |(row, _)| row as usize + 1);

    let mut rows = range.rows().enumerate();
    let mut builder = loop {
        match rows.next() {
            None => {
                return Err(IngestError::EmptySheet {
                    source_name: format!("{} [{name}]", path.display()),
                });
            }
            Some((_, cells)) => {
                let texts: Vec<String> = cells.iter().map(cell_text).collect();
                if texts.iter().any(|text| !text.trim().is_empty()) {
                    break SheetBuilder::new(texts.iter().map(String::as_str));
                }
            }
        }
    };
    for (offset, cells) in rows {
        let texts: Vec<String> = cells.iter().map(cell_text).collect();
        builder.push(first_line + offset, texts.iter().map(String::as_str));
    }

    let out = builder.finish();
    debug!(
        sheet = %name,
        columns = out.sheet.headers.len(),
        rows = out.sheet.rows.len(),
        "worksheet read"
    );
    Ok(out)
}
