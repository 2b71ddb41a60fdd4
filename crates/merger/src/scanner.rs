use crate::config::ScanConfig;
use crate::error::{MergeError, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds the source files whose text may reference resource keys
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
    respect_gitignore: bool,
    excluded: Vec<PathBuf>,
}

impl SourceScanner {
    pub fn new(root: impl AsRef<Path>, config: &ScanConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: config.normalized_extensions(),
            respect_gitignore: config.respect_gitignore,
            excluded: Vec::new(),
        }
    }

    /// Never report `path` (e.g. the resource table itself)
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.excluded
            .push(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    /// Recursive walk; sorted paths of every file with an allowed extension
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(MergeError::NotFound(self.root.clone()));
        }

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .follow_links(false)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !self.has_allowed_extension(path) {
                        continue;
                    }
                    if self.is_excluded(path) {
                        log::debug!("Skipping excluded file {}", path.display());
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!(
            "Found {} candidate files under {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let file_name = path.file_name();
        if !self.excluded.iter().any(|ex| ex.file_name() == file_name) {
            return false;
        }
        path.canonicalize()
            .map(|canonical| self.excluded.contains(&canonical))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn finds_allowed_extensions_recursively() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("Views/Home")).unwrap();
        fs::write(root.join("Program.cs"), "class P {}").unwrap();
        fs::write(root.join("Views/Home/Index.CSHTML"), "@Res.A").unwrap();
        fs::write(root.join("Views/site.css"), "body {}").unwrap();
        fs::write(root.join("README.md"), "docs").unwrap();

        let files = SourceScanner::new(root, &ScanConfig::default()).scan().unwrap();
        assert_eq!(
            names(root, &files),
            vec!["Program.cs", "Views/Home/Index.CSHTML"]
        );
    }

    #[test]
    fn gitignore_is_opt_in() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("obj")).unwrap();
        fs::write(root.join(".gitignore"), "/obj\n").unwrap();
        fs::write(root.join("obj/Generated.cs"), "x").unwrap();
        fs::write(root.join("App.cs"), "x").unwrap();

        let all = SourceScanner::new(root, &ScanConfig::default()).scan().unwrap();
        assert_eq!(names(root, &all), vec!["App.cs", "obj/Generated.cs"]);

        let config = ScanConfig {
            respect_gitignore: true,
            ..Default::default()
        };
        let filtered = SourceScanner::new(root, &config).scan().unwrap();
        assert_eq!(names(root, &filtered), vec!["App.cs"]);
    }

    #[test]
    fn excluded_paths_are_skipped() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("Strings.json"), "{}").unwrap();
        fs::write(root.join("data.json"), "{}").unwrap();

        let config = ScanConfig {
            extensions: vec!["json".to_string()],
            ..Default::default()
        };
        let files = SourceScanner::new(root, &config)
            .exclude(root.join("Strings.json"))
            .scan()
            .unwrap();
        assert_eq!(names(root, &files), vec!["data.json"]);
    }

    #[test]
    fn missing_root_is_not_found() {
        let temp = tempdir().unwrap();
        let err = SourceScanner::new(temp.path().join("nope"), &ScanConfig::default())
            .scan()
            .unwrap_err();
        assert!(matches!(err, MergeError::NotFound(_)));
    }
}
