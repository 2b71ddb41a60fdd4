use std::path::PathBuf;
use thiserror::Error;

/// Result type for resource table operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur while reading or writing a resource table
#[derive(Error, Debug)]
pub enum TableError {
    /// The table file does not exist
    #[error("Resource table not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The table content is malformed
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A key is defined more than once
    #[error("Duplicate key '{key}' in {}", path.display())]
    DuplicateKey { path: PathBuf, key: String },

    /// The file extension maps to no known table format
    #[error("Unsupported resource table format: {0}")]
    UnsupportedFormat(String),

    /// The requested write cannot be expressed against the existing document
    #[error("Unsupported table write: {0}")]
    Unsupported(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TableError {
    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a duplicate key error
    pub fn duplicate_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Create an unsupported write error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// True for failures that mean the table content itself is unusable
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::DuplicateKey { .. })
    }
}
