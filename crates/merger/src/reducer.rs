use crate::error::Result;
use crate::index::DuplicateGroup;
use crate::planner::resolve_mappings;
use crate::selector::{CanonicalMapping, CanonicalSelector};
use resmerge_table::ResourceEntry;
use std::collections::HashSet;

/// Resource table with every defunct key removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedTable {
    /// Surviving entries, original relative order
    pub entries: Vec<ResourceEntry>,

    /// One mapping per actionable group
    pub mappings: Vec<CanonicalMapping>,

    /// Number of entries dropped
    pub removed: usize,
}

impl ReducedTable {
    pub fn is_unchanged(&self) -> bool {
        self.removed == 0
    }
}

/// Drop every entry whose key lost canonical selection.
///
/// Fails with [`MergeError::Conflict`](crate::MergeError::Conflict) if any key
/// is both kept for one value and dropped for another, or dropped for two
/// different values.
pub fn reduce_table(
    entries: &[ResourceEntry],
    groups: &[DuplicateGroup],
    selector: &CanonicalSelector,
) -> Result<ReducedTable> {
    let mappings = resolve_mappings(groups, selector)?;

    let drop: HashSet<&str> = mappings
        .iter()
        .flat_map(|mapping| mapping.defunct_keys.iter().map(String::as_str))
        .collect();
    let kept: Vec<ResourceEntry> = entries
        .iter()
        .filter(|entry| !drop.contains(entry.key.as_str()))
        .cloned()
        .collect();
    let removed = entries.len() - kept.len();

    log::info!(
        "Reduced resource table from {} to {} entries",
        entries.len(),
        kept.len()
    );

    Ok(ReducedTable {
        entries: kept,
        mappings,
        removed,
    })
}
