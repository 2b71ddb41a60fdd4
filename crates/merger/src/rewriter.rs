use crate::config::MergeConfig;
use crate::encoding::{self, TextEncoding};
use crate::error::{Result, RewriteError};
use crate::planner::RenameMap;
use crate::substitute::{Replacement, Substituter};
use resmerge_table::write_atomic;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEditResult {
    pub path: PathBuf,
    /// Encoding detected on read and used for the write
    pub encoding: TextEncoding,
    pub changed: bool,
    /// Rewritten text, only when `changed`
    pub new_content: Option<String>,
    pub replacements: Vec<Replacement>,
}

/// Applies a [`RenameMap`] to files, writing only those that change
#[derive(Debug, Clone)]
pub struct FileRewriter {
    substituter: Substituter,
    atomic_writes: bool,
}

impl FileRewriter {
    pub fn new(renames: &RenameMap, config: &MergeConfig) -> Result<Self> {
        Ok(Self {
            substituter: Substituter::new(renames, config.whole_identifier)?,
            atomic_writes: config.atomic_writes,
        })
    }

    /// Read, substitute, and write back in the original encoding if anything
    /// was replaced. Unchanged files are not opened for writing.
    pub fn rewrite(&self, path: &Path) -> std::result::Result<FileEditResult, RewriteError> {
        let bytes = fs::read(path)?;

        if self.substituter.is_empty() {
            return Ok(unchanged(path, encoding::detect(&bytes)));
        }

        let decoded = encoding::decode(&bytes)?;
        let Some(substitution) = self.substituter.apply(&decoded.text) else {
            log::debug!("No defunct keys in {}", path.display());
            return Ok(unchanged(path, decoded.encoding));
        };

        let encoded = decoded.encode(&substitution.text)?;
        if self.atomic_writes {
            write_atomic(path, &encoded)?;
        } else {
            fs::write(path, &encoded)?;
        }

        for replacement in &substitution.replacements {
            log::info!(
                "Replaced {} -> {} in {} ({}x)",
                replacement.defunct,
                replacement.canonical,
                path.display(),
                replacement.count
            );
        }

        Ok(FileEditResult {
            path: path.to_path_buf(),
            encoding: decoded.encoding,
            changed: true,
            new_content: Some(substitution.text),
            replacements: substitution.replacements,
        })
    }
}

fn unchanged(path: &Path, encoding: TextEncoding) -> FileEditResult {
    FileEditResult {
        path: path.to_path_buf(),
        encoding,
        changed: false,
        new_content: None,
        replacements: Vec::new(),
    }
}
