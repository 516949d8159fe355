use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

/// Why a candidate record could not be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid email address '{email}'")]
    InvalidEmail { email: String },

    #[error("invalid email address '{email}': contains forbidden character '{character}'")]
    ForbiddenCharacter { email: String, character: char },
}

/// Problems with a column mapping, either when it is built or when it is
/// resolved against a header row
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("column mapping needs at least {required} columns, got {actual}")]
    TooFewColumns { required: usize, actual: usize },

    #[error("source column '{0}' is mapped more than once")]
    DuplicateSource(String),

    #[error("target column '{0}' is mapped more than once")]
    DuplicateTarget(String),

    #[error("invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("column '{0}' not found in CSV header")]
    MissingColumn(String),
}

/// Structural failures. Any of these means nothing was committed.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("CSV file not found: {path}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV header from {path}")]
    HeaderUnreadable {
        path: PathBuf,
        #[source]
        source: Option<csv::Error>,
    },

    #[error("column mapping does not match the CSV header: {0}")]
    ColumnMappingInvalid(#[from] MappingError),

    #[error("failed to parse row {row}")]
    RowUnreadable {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("duplicate check failed at row {row}")]
    DuplicateCheckFailed {
        row: usize,
        #[source]
        source: StorageError,
    },

    #[error("transaction failed: {0}")]
    TransactionFailed(#[source] StorageError),
}
