use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("schema field key is empty (label '{label}')")]
    EmptyKey { label: String },
    #[error("duplicate schema field key: {key}")]
    DuplicateKey { key: String },
    #[error("invalid range for '{key}': min {min} is greater than max {max}")]
    InvalidRange { key: String, min: f64, max: f64 },
}

pub type Result<T> = std::result::Result<T, ModelError>;
