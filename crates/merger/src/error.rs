use resmerge_table::TableError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MergeError>;

/// Fatal errors of a merge run
#[derive(Error, Debug)]
pub enum MergeError {
    /// Resource table or source directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Resource table content is malformed
    #[error("Resource table parse error: {0}")]
    Parse(TableError),

    /// A key would be renamed inconsistently
    #[error("Rename conflict on key '{key}': claimed by {first:?} and {second:?}")]
    Conflict {
        key: String,
        first: String,
        second: String,
    },

    /// Reading or writing the resource table failed
    #[error("Resource table error: {0}")]
    Table(TableError),

    /// A source file could not be rewritten (only fatal with `fail_fast`)
    #[error("Failed to rewrite {}: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MergeError {
    pub fn conflict(
        key: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            key: key.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<TableError> for MergeError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::NotFound(path) => Self::NotFound(path),
            err if err.is_parse_failure() => Self::Parse(err),
            err => Self::Table(err),
        }
    }
}

/// Per-file failure of the rewrite phase; the run records it and moves on
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Text could not be decoded from, or encoded back into, a file's encoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("content is not valid {encoding}: {detail}")]
    Malformed {
        encoding: &'static str,
        detail: String,
    },

    #[error("character {ch:?} cannot be represented in {encoding}")]
    Unmappable { encoding: &'static str, ch: char },
}

impl EncodingError {
    pub(crate) fn malformed(encoding: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            encoding,
            detail: detail.into(),
        }
    }
}
