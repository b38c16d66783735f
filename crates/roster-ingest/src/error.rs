//! Error types for sheet ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a file into a parsed sheet.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not one of the supported sheet formats.
    #[error("unsupported file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Byte content uses an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {source_name}")]
    UnsupportedEncoding {
        source_name: String,
        encoding: &'static str,
    },

    // === Parsing Errors ===
    /// Delimited text could not be parsed.
    #[error("failed to parse {source_name}: {message}")]
    CsvParse {
        source_name: String,
        message: String,
    },

    /// Workbook could not be opened or read.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Requested worksheet does not exist.
    #[error("sheet '{name}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    /// No header row could be read.
    #[error("{source_name} contains no header row")]
    EmptySheet { source_name: String },
}

impl IngestError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
