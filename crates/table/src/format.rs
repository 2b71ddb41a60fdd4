use crate::error::{Result, TableError};
use crate::json::JsonTable;
use crate::resx::ResxTable;
use crate::types::ResourceEntry;
use std::path::Path;

/// Loader/writer for one on-disk table format
pub trait ResourceTable {
    /// Read all entries in document order
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>>;

    /// Persist `entries` to `path`
    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<()>;
}

/// Known resource table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// .NET XML resource file
    Resx,
    /// Flat JSON object
    Json,
}

impl TableFormat {
    /// Infer the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "resx" => Ok(Self::Resx),
            "json" => Ok(Self::Json),
            _ => Err(TableError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn table(self) -> Box<dyn ResourceTable> {
        match self {
            Self::Resx => Box::new(ResxTable),
            Self::Json => Box::new(JsonTable),
        }
    }
}

/// Pick the loader/writer for `path` by its extension
pub fn table_for_path(path: impl AsRef<Path>) -> Result<Box<dyn ResourceTable>> {
    Ok(TableFormat::from_path(path.as_ref())?.table())
}

/// Read a file as UTF-8 text, mapping a missing file to [`TableError::NotFound`]
pub(crate) fn read_table_text(path: &Path) -> Result<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    String::from_utf8(bytes).map_err(|err| TableError::parse(path, format!("not UTF-8: {err}")))
}
