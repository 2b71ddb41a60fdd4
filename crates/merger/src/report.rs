use crate::encoding::TextEncoding;
use crate::selector::CanonicalMapping;
use crate::substitute::Replacement;
use serde::Serialize;
use std::path::PathBuf;

/// Everything a merge run did, for humans (`render_text`) and tools (serde)
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub table: PathBuf,
    pub source_dir: PathBuf,
    pub entries_before: usize,
    pub entries_after: usize,
    /// Whether the resource table was written back
    pub table_rewritten: bool,
    pub merged: Vec<MergedValue>,
    pub files_scanned: usize,
    pub files_changed: Vec<FileChange>,
    pub failures: Vec<FileFailure>,
    /// Defunct keys that no scanned file mentioned
    pub unreferenced_keys: Vec<String>,
}

/// A value that had several keys, and the key it kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedValue {
    pub value: String,
    pub keys: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

impl MergedValue {
    /// All keys in group order, canonical included
    pub fn from_mapping(mapping: &CanonicalMapping, keys: &[String]) -> Self {
        Self {
            value: mapping.value.clone(),
            keys: keys.to_vec(),
            selected: mapping.canonical_key.clone(),
        }
    }
}

impl MergeReport {
    /// Total key occurrences rewritten across all files
    pub fn replacement_count(&self) -> usize {
        self.files_changed
            .iter()
            .flat_map(|file| &file.replacements)
            .map(|replacement| replacement.count)
            .sum()
    }

    /// Nothing left to merge and nothing was changed
    pub fn is_noop(&self) -> bool {
        self.merged.is_empty() && self.files_changed.is_empty() && !self.table_rewritten
    }

    pub fn render_text(&self) -> String {
        let mut md = String::new();
        md.push_str("# Resource merge report\n\n");
        md.push_str(&format!("- Table: `{}`\n", self.table.display()));
        md.push_str(&format!("- Source: `{}`\n", self.source_dir.display()));
        md.push_str(&format!(
            "- Entries: `{}` -> `{}`{}\n",
            self.entries_before,
            self.entries_after,
            if self.table_rewritten { "" } else { " (table untouched)" }
        ));
        md.push_str(&format!(
            "- Files: `{}` scanned, `{}` changed, `{}` failed\n",
            self.files_scanned,
            self.files_changed.len(),
            self.failures.len()
        ));
        md.push_str(&format!("- Replacements: `{}`\n\n", self.replacement_count()));

        if self.merged.is_empty() {
            md.push_str("No duplicate values found.\n");
            return md;
        }

        md.push_str("## Merged values\n\n");
        md.push_str("| value | keys | selected |\n");
        md.push_str("|---|---|---|\n");
        for merged in &self.merged {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&merged.value),
                merged
                    .keys
                    .iter()
                    .map(|key| escape_cell(key))
                    .collect::<Vec<_>>()
                    .join(", "),
                escape_cell(&merged.selected)
            ));
        }
        md.push('\n');

        if !self.files_changed.is_empty() {
            md.push_str("## Changed files\n\n");
            for file in &self.files_changed {
                md.push_str(&format!(
                    "- `{}` ({})\n",
                    file.path.display(),
                    file.encoding
                ));
                for replacement in &file.replacements {
                    md.push_str(&format!(
                        "  - `{}` -> `{}` x{}\n",
                        replacement.defunct, replacement.canonical, replacement.count
                    ));
                }
            }
            md.push('\n');
        }

        if !self.failures.is_empty() {
            md.push_str("## Failures\n\n");
            for failure in &self.failures {
                md.push_str(&format!(
                    "- `{}`: {}\n",
                    failure.path.display(),
                    failure.error
                ));
            }
            md.push('\n');
        }

        if !self.unreferenced_keys.is_empty() {
            md.push_str("## Unreferenced defunct keys\n\n");
            for key in &self.unreferenced_keys {
                md.push_str(&format!("- `{key}`\n"));
            }
            md.push('\n');
        }

        md
    }
}

fn escape_cell(value: &str) -> String {
    let one_line: String = value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect();
    format!("`{}`", one_line.replace('|', "\\|").replace('`', "'"))
}
