//! Error types for mapping operations.

use thiserror::Error;

/// Errors from editing a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Target key is not part of the schema.
    #[error("unknown field key: {0}")]
    UnknownField(String),
    /// Header is not present in the sheet.
    #[error("header not found: {0}")]
    HeaderNotFound(String),
    /// Another header already holds the target and sharing is not allowed.
    #[error("field '{target}' is already mapped from '{header}'")]
    TargetAlreadyUsed { target: String, header: String },
}

pub type Result<T> = std::result::Result<T, MappingError>;
