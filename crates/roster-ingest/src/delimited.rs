//! Delimited text reading: CSV files, CSV bytes and pasted text.

use std::fs;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::sheet::{IngestedSheet, SheetBuilder};

/// Delimiters tried when sniffing pasted text, in priority order.
pub const CANDIDATE_DELIMITERS: &[u8] = b"\t,|;";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Strips a UTF-8 byte-order mark and rejects UTF-16 content.
fn strip_bom<'a>(bytes: &'a [u8], source_name: &str) -> Result<&'a [u8]> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(IngestError::UnsupportedEncoding {
            source_name: source_name.to_string(),
            encoding: "UTF-16 LE",
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(IngestError::UnsupportedEncoding {
            source_name: source_name.to_string(),
            encoding: "UTF-16 BE",
        });
    }
    Ok(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes))
}

/// Reads comma-separated bytes.
pub fn read_csv_bytes(bytes: &[u8], source_name: &str) -> Result<IngestedSheet> {
    read_delimited(strip_bom(bytes, source_name)?, b',', source_name)
}

/// Reads a comma-separated file.
pub fn read_csv_path(path: &Path) -> Result<IngestedSheet> {
    let bytes = fs::read(path).map_err(|e| IngestError::file(path, e))?;
    read_csv_bytes(&bytes, &path.display().to_string())
}

/// Reads pasted text, sniffing the delimiter first.
pub fn parse_text(text: &str) -> Result<IngestedSheet> {
    parse_named_text(text, "pasted text")
}

/// Reads a `.txt` or `.tsv` export, sniffing the delimiter like pasted text.
pub fn read_text_path(path: &Path) -> Result<IngestedSheet> {
    let bytes = fs::read(path).map_err(|e| IngestError::file(path, e))?;
    let source_name = path.display().to_string();
    let bytes = strip_bom(&bytes, &source_name)?;
    let text = std::str::from_utf8(bytes).map_err(|_| IngestError::UnsupportedEncoding {
        source_name: source_name.clone(),
        encoding: "non-UTF-8",
    })?;
    parse_named_text(text, &source_name)
}

fn parse_named_text(text: &str, source_name: &str) -> Result<IngestedSheet> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);
    debug!(delimiter = %char::from(delimiter).escape_default(), "sniffed delimiter");
    read_delimited(text.as_bytes(), delimiter, source_name)
}

/// Picks the delimiter that splits the first non-blank line into the most
/// columns. Comma wins ties.
pub fn sniff_delimiter(text: &str) -> u8 {
    let Some(first_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return b',';
    };
    let columns = |delimiter: u8| header_width(first_line, delimiter);
    let mut best = (b',', columns(b','));
    for &delimiter in CANDIDATE_DELIMITERS {
        let width = columns(delimiter);
        if width > best.1 {
            best = (delimiter, width);
        }
    }
    best.0
}

fn header_width(line: &str, delimiter: u8) -> usize {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(line.as_bytes());
    reader
        .records()
        .next()
        .and_then(|record| record.ok())
        .map_or(0, |record| record.len())
}

fn read_delimited<R: Read>(input: R, delimiter: u8, source_name: &str) -> Result<IngestedSheet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input);
    let parse_error = |err: csv::Error| IngestError::CsvParse {
        source_name: source_name.to_string(),
        message: err.to_string(),
    };

    let mut records = reader.records();
    let mut builder = loop {
        match records.next() {
            None => {
                return Err(IngestError::EmptySheet {
                    source_name: source_name.to_string(),
                });
            }
            Some(record) => {
                let record = record.map_err(parse_error)?;
                if record.iter().any(|cell| !cell.trim().is_empty()) {
                    break SheetBuilder::new(record.iter());
                }
            }
        }
    };

    for (offset, record) in records.enumerate() {
        let record = record.map_err(parse_error)?;
        let line = record
            .position()
            .map_or(offset + 2, |position| position.line() as usize);
        builder.push(line, record.iter());
    }

    let out = builder.finish();
    debug!(
        source = source_name,
        columns = out.sheet.headers.len(),
        rows = out.sheet.rows.len(),
        "delimited sheet read"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_each_candidate() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c"), b'|');
        assert_eq!(sniff_delimiter("a;b;c"), b';');
        assert_eq!(sniff_delimiter("a,b;c"), b',');
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn reads_bytes_with_bom_and_line_numbers() {
        let bytes = b"\xEF\xBB\xBFFirst,Last,40m Dash\nAnn,Lee,4.5\n,,\nBo,Diaz,\n";
        let out = read_csv_bytes(bytes, "upload.csv").expect("read csv");
        assert_eq!(out.sheet.headers[0], "First");
        let lines: Vec<_> = out.sheet.rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(out.sheet.rows[1].cells[2], "");
    }

    #[test]
    fn rejects_utf16() {
        let err = read_csv_bytes(&[0xFF, 0xFE, b'a'], "upload.csv").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            read_csv_bytes(b"", "upload.csv"),
            Err(IngestError::EmptySheet { .. })
        ));
    }

    #[test]
    fn parses_quoted_pasted_text() {
        let out = parse_text("First\tLast\tNotes\n\"Ann\"\tLee\t\"likes, commas\"\n").expect("parse");
        assert_eq!(out.sheet.headers.len(), 3);
        assert_eq!(out.sheet.rows[0].cells[2], "likes, commas");
    }
}
