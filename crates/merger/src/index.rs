use resmerge_table::ResourceEntry;
use serde::Serialize;
use std::collections::HashMap;

/// All keys that share one value, in the order they were first seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    value: String,
    keys: Vec<String>,
}

impl DuplicateGroup {
    /// Build a group from its keys; `None` if `keys` is empty
    pub fn new<I, S>(value: impl Into<String>, keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return None;
        }
        Some(Self {
            value: value.into(),
            keys,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Never empty
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// More than one key shares the value
    pub fn is_actionable(&self) -> bool {
        self.keys.len() > 1
    }
}

/// Value → keys index over a resource table.
///
/// This runs opposite to the table itself: the resource *value* is the lookup
/// key here and resource keys are the payload.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    groups: Vec<DuplicateGroup>,
    by_value: HashMap<String, usize>,
}

impl DuplicateIndex {
    /// Single left-to-right scan; groups appear in first-seen value order
    pub fn build(entries: &[ResourceEntry]) -> Self {
        let mut index = Self::default();

        for entry in entries {
            match index.by_value.get(&entry.value) {
                Some(&slot) => {
                    let group = &mut index.groups[slot];
                    group.keys.push(entry.key.clone());
                    log::info!(
                        "Duplicate detected: value {:?} shared by [{}]",
                        group.value,
                        group.keys.join(", ")
                    );
                }
                None => {
                    index
                        .by_value
                        .insert(entry.value.clone(), index.groups.len());
                    index.groups.push(DuplicateGroup {
                        value: entry.value.clone(),
                        keys: vec![entry.key.clone()],
                    });
                }
            }
        }

        index
    }

    /// Index prepared groups as-is; the first group wins a repeated value
    pub fn from_groups(groups: Vec<DuplicateGroup>) -> Self {
        let mut by_value = HashMap::with_capacity(groups.len());
        for (slot, group) in groups.iter().enumerate() {
            by_value.entry(group.value.clone()).or_insert(slot);
        }
        Self { groups, by_value }
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn get(&self, value: &str) -> Option<&DuplicateGroup> {
        self.by_value.get(value).map(|&slot| &self.groups[slot])
    }

    /// Groups with more than one key
    pub fn actionable(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|group| group.is_actionable())
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
