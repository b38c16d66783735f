#![deny(unsafe_code)]

//! Roster sheet ingestion.
//!
//! Turns CSV files, pasted text and spreadsheet workbooks into a
//! [`roster_model::ParsedSheet`]: one header row, trimmed cells, blank rows
//! dropped and every row tagged with its 1-based line in the source.

pub mod delimited;
pub mod error;
pub mod sheet;
pub mod workbook;

use std::path::Path;

pub use delimited::{parse_text, read_csv_bytes, read_csv_path, read_text_path, sniff_delimiter};
pub use error::{IngestError, Result};
pub use sheet::IngestedSheet;
pub use workbook::{WORKBOOK_EXTENSIONS, list_sheets, read_workbook};

/// Reads any supported file, choosing the reader by extension.
///
/// `sheet` selects a worksheet in workbooks and is ignored for text files.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<IngestedSheet> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => read_csv_path(path),
        "txt" | "tsv" => read_text_path(path),
        ext if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook(path, sheet),
        _ => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
