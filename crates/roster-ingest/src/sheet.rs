//! Assembly of raw rows into a [`ParsedSheet`].

use roster_model::{ImportIssue, IssueKind, ParsedSheet};
use tracing::warn;

/// A parsed sheet plus issues noticed while reading it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestedSheet {
    pub sheet: ParsedSheet,
    /// Non-blocking notes such as dropped overflow cells.
    pub issues: Vec<ImportIssue>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().to_string()
}

/// Collects rows under a header, skipping blank rows and padding short ones.
#[derive(Debug)]
pub(crate) struct SheetBuilder {
    out: IngestedSheet,
}

impl SheetBuilder {
    pub(crate) fn new<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let headers = headers.into_iter().map(normalize_header).collect();
        Self {
            out: IngestedSheet {
                sheet: ParsedSheet::new(headers),
                issues: Vec::new(),
            },
        }
    }

    pub(crate) fn push<'a>(&mut self, line: usize, cells: impl IntoIterator<Item = &'a str>) {
        let cells: Vec<String> = cells.into_iter().map(normalize_cell).collect();
        if cells.iter().all(String::is_empty) {
            return;
        }
        let width = self.out.sheet.headers.len();
        let overflow = cells
            .iter()
            .skip(width)
            .filter(|cell| !cell.is_empty())
            .count();
        if overflow > 0 {
            warn!(line, overflow, "dropping cells beyond the last header");
            self.out.issues.push(
                ImportIssue::new(
                    IssueKind::ExtraCells,
                    format!("{overflow} cell(s) beyond the last header were ignored"),
                )
                .at_row(line),
            );
        }
        self.out.sheet.push_row(line, cells);
    }

    pub(crate) fn finish(self) -> IngestedSheet {
        self.out
    }
}
