//! Error types for kasin-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, KasinError>;

/// Top-level error type for pipeline operations
#[derive(Error, Debug)]
pub enum KasinError {
    /// Mapping-file errors
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Metadata-file errors
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Catalog lookup errors
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Calibre database errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The library root handed to a stage does not exist
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Configuration file errors
    #[error("config error: {0}")]
    Config(String),

    /// IO errors outside the categories above
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mapping-file errors
#[derive(Error, Debug)]
pub enum MappingError {
    /// Mapping file missing or unreadable
    #[error("cannot read mapping file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Mapping file could not be written
    #[error("cannot write mapping file {path}: {reason}")]
    Unwritable { path: PathBuf, reason: String },
}

/// A mapping line that cannot be parsed; such lines are logged and
/// dropped, never fatal to the surrounding parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct MalformedLine {
    pub reason: String,
}

impl MalformedLine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Metadata-file errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Metadata file missing or unreadable
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// Metadata file is not a usable OPF document
    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Metadata file could not be rewritten
    #[error("cannot write {path}: {reason}")]
    Unwritable { path: PathBuf, reason: String },
}

/// Catalog lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    /// Transport-level failure reaching the catalog
    #[error("request failed: {0}")]
    Request(String),

    /// Catalog answered with an unexpected status
    #[error("catalog returned status {0}")]
    Status(u16),

    /// Operator declined to clear a challenge
    #[error("operator aborted during challenge")]
    Aborted,
}

/// Calibre database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Database file missing or not openable
    #[error("cannot open database {path}: {reason}")]
    Unreachable { path: PathBuf, reason: String },

    /// Query failed
    #[error("query failed: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }
}
