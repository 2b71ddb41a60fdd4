use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use crate::index::DuplicateIndex;
use crate::planner::{plan_renames, RenameMap};
use crate::reducer::{reduce_table, ReducedTable};
use crate::report::{FileChange, FileFailure, MergeReport, MergedValue};
use crate::rewriter::FileRewriter;
use crate::scanner::SourceScanner;
use crate::selector::CanonicalSelector;
use resmerge_table::{table_for_path, ResourceEntry, ResourceTable};
use std::collections::HashSet;
use std::path::Path;

/// Everything decided before any file is written
#[derive(Debug, Clone)]
pub struct MergePlan {
    pub index: DuplicateIndex,
    pub reduced: ReducedTable,
    pub renames: RenameMap,
}

impl MergePlan {
    /// Index, reduce and plan; a conflict anywhere fails the whole plan
    pub fn build(entries: &[ResourceEntry], selector: &CanonicalSelector) -> Result<Self> {
        Self::from_index(entries, DuplicateIndex::build(entries), selector)
    }

    /// Reduce and plan over an index built elsewhere
    pub fn from_index(
        entries: &[ResourceEntry],
        index: DuplicateIndex,
        selector: &CanonicalSelector,
    ) -> Result<Self> {
        let reduced = reduce_table(entries, index.groups(), selector)?;
        let renames = plan_renames(index.groups(), selector)?;

        Ok(Self {
            index,
            reduced,
            renames,
        })
    }

    fn merged_values(&self) -> Vec<MergedValue> {
        self.reduced
            .mappings
            .iter()
            .filter_map(|mapping| {
                let group = self.index.get(&mapping.value)?;
                Some(MergedValue::from_mapping(mapping, group.keys()))
            })
            .collect()
    }
}

/// Deduplicates a resource table and rewrites references in a source tree
#[derive(Debug, Clone, Default)]
pub struct ResourceMerger {
    config: MergeConfig,
    selector: CanonicalSelector,
}

impl ResourceMerger {
    pub fn new(config: MergeConfig) -> Result<Self> {
        config.validate().map_err(MergeError::invalid_config)?;
        let selector = CanonicalSelector::new(config.canonical_marker.clone());
        Ok(Self { config, selector })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run the full merge.
    ///
    /// The plan is complete and conflict-free before the table or any source
    /// file is written. Per-file failures are collected in the report unless
    /// `fail_fast` is set.
    pub fn run(&self, table_path: &Path, source_dir: &Path) -> Result<MergeReport> {
        if !table_path.is_file() {
            return Err(MergeError::NotFound(table_path.to_path_buf()));
        }
        if !source_dir.is_dir() {
            return Err(MergeError::NotFound(source_dir.to_path_buf()));
        }

        let table = table_for_path(table_path)?;
        let entries = table.load(table_path)?;
        log::info!(
            "Loaded {} resources from {}",
            entries.len(),
            table_path.display()
        );

        self.merge_entries(table.as_ref(), table_path, source_dir, entries)
    }

    fn merge_entries(
        &self,
        table: &dyn ResourceTable,
        table_path: &Path,
        source_dir: &Path,
        entries: Vec<ResourceEntry>,
    ) -> Result<MergeReport> {
        let plan = MergePlan::build(&entries, &self.selector)?;
        let files = SourceScanner::new(source_dir, &self.config.scan)
            .exclude(table_path)
            .scan()?;
        let rewriter = FileRewriter::new(&plan.renames, &self.config)?;

        let mut report = MergeReport {
            table: table_path.to_path_buf(),
            source_dir: source_dir.to_path_buf(),
            entries_before: entries.len(),
            entries_after: plan.reduced.entries.len(),
            merged: plan.merged_values(),
            files_scanned: files.len(),
            ..Default::default()
        };

        if !plan.reduced.is_unchanged() {
            table.save(table_path, &plan.reduced.entries)?;
            report.table_rewritten = true;
            log::info!(
                "Removed {} duplicate resources from {}",
                plan.reduced.removed,
                table_path.display()
            );
        }

        if plan.renames.is_empty() {
            log::info!("No duplicate keys to substitute");
            return Ok(report);
        }

        let mut referenced: HashSet<String> = HashSet::new();
        for path in &files {
            match rewriter.rewrite(path) {
                Ok(result) => {
                    if !result.changed {
                        continue;
                    }
                    referenced.extend(result.replacements.iter().map(|r| r.defunct.clone()));
                    report.files_changed.push(FileChange {
                        path: result.path,
                        encoding: result.encoding,
                        replacements: result.replacements,
                    });
                }
                Err(source) if self.config.fail_fast => {
                    return Err(MergeError::Rewrite {
                        path: path.clone(),
                        source,
                    });
                }
                Err(err) => {
                    log::warn!("Skipping {}: {err}", path.display());
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        report.unreferenced_keys = plan
            .renames
            .defunct_keys()
            .filter(|key| !referenced.contains(*key))
            .map(str::to_string)
            .collect();
        for key in &report.unreferenced_keys {
            log::warn!("Defunct key {key} is not referenced by any scanned file");
        }

        log::info!(
            "Rewrote {} of {} files ({} replacements)",
            report.files_changed.len(),
            report.files_scanned,
            report.replacement_count()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DuplicateGroup;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, &str)]) -> Vec<ResourceEntry> {
        pairs.iter().map(|&(k, v)| ResourceEntry::new(k, v)).collect()
    }

    #[test]
    fn plan_covers_every_actionable_group() {
        let table = entries(&[
            ("Yes", "Yes"),
            ("CommonYes", "Yes"),
            ("Confirm", "Yes"),
            ("No", "No"),
        ]);

        let plan = MergePlan::build(&table, &CanonicalSelector::default()).unwrap();

        assert_eq!(plan.reduced.entries, entries(&[("CommonYes", "Yes"), ("No", "No")]));
        let renames: Vec<(&str, &str)> = plan.renames.iter().collect();
        assert_eq!(renames, vec![("Confirm", "CommonYes"), ("Yes", "CommonYes")]);
        assert_eq!(
            plan.merged_values(),
            vec![MergedValue {
                value: "Yes".to_string(),
                keys: vec!["Yes".into(), "CommonYes".into(), "Confirm".into()],
                selected: "CommonYes".to_string(),
            }]
        );
    }

    #[test]
    fn conflicting_groups_fail_the_plan() {
        let table = entries(&[
            ("SaveButton", "Save"),
            ("CommonSave", "Save"),
            ("CommonStore", "Store"),
        ]);
        let index = DuplicateIndex::from_groups(vec![
            DuplicateGroup::new("Save", ["SaveButton", "CommonSave"]).unwrap(),
            DuplicateGroup::new("Store", ["SaveButton", "CommonStore"]).unwrap(),
        ]);

        let err = MergePlan::from_index(&table, index, &CanonicalSelector::default()).unwrap_err();
        assert!(matches!(err, MergeError::Conflict { ref key, .. } if key == "SaveButton"));
    }

    #[test]
    fn conflict_leaves_table_and_sources_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let table_path = temp.path().join("Strings.json");
        let source_dir = temp.path().join("src");
        std::fs::create_dir_all(&source_dir).unwrap();
        let table_text = "{\"SaveButton\": \"Save\", \"CommonSave\": \"Save\"}";
        std::fs::write(&table_path, table_text).unwrap();
        std::fs::write(source_dir.join("App.cs"), "R.SaveButton").unwrap();

        // a key claimed by two values cannot come out of a loader
        let claimed_twice = entries(&[
            ("SaveButton", "Save"),
            ("CommonSave", "Save"),
            ("SaveButton", "Store"),
            ("CommonStore", "Store"),
        ]);
        let err = ResourceMerger::default()
            .merge_entries(&resmerge_table::JsonTable, &table_path, &source_dir, claimed_twice)
            .unwrap_err();

        assert!(matches!(err, MergeError::Conflict { .. }));
        assert_eq!(std::fs::read_to_string(&table_path).unwrap(), table_text);
        assert_eq!(
            std::fs::read_to_string(source_dir.join("App.cs")).unwrap(),
            "R.SaveButton"
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MergeConfig {
            canonical_marker: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            ResourceMerger::new(config),
            Err(MergeError::InvalidConfig(_))
        ));
    }
}
