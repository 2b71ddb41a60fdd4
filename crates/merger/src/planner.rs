use crate::error::{MergeError, Result};
use crate::index::DuplicateGroup;
use crate::selector::{CanonicalMapping, CanonicalSelector};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Defunct key → canonical key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenameMap {
    renames: BTreeMap<String, String>,
}

impl RenameMap {
    /// Build from explicit pairs.
    ///
    /// A defunct key listed twice, or a key that is both renamed and a rename
    /// target, is a [`MergeError::Conflict`].
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut renames: BTreeMap<String, String> = BTreeMap::new();
        for (defunct, canonical) in pairs {
            let (defunct, canonical) = (defunct.into(), canonical.into());
            if let Some(previous) = renames.get(&defunct) {
                return Err(MergeError::conflict(defunct, previous.clone(), canonical));
            }
            renames.insert(defunct, canonical);
        }

        let map = Self { renames };
        if let Some((defunct, canonical)) = map
            .renames
            .iter()
            .find(|(_, canonical)| map.renames.contains_key(canonical.as_str()))
        {
            return Err(MergeError::conflict(
                canonical.clone(),
                defunct.clone(),
                map.renames[canonical].clone(),
            ));
        }
        Ok(map)
    }

    pub fn get(&self, defunct: &str) -> Option<&str> {
        self.renames.get(defunct).map(String::as_str)
    }

    /// Pairs in defunct-key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames
            .iter()
            .map(|(defunct, canonical)| (defunct.as_str(), canonical.as_str()))
    }

    pub fn defunct_keys(&self) -> impl Iterator<Item = &str> {
        self.renames.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Rename every defunct key of every actionable group to its canonical key
pub fn plan_renames(groups: &[DuplicateGroup], selector: &CanonicalSelector) -> Result<RenameMap> {
    let mut renames = BTreeMap::new();
    for mapping in resolve_mappings(groups, selector)? {
        for defunct in mapping.defunct_keys {
            log::debug!("Planned rename {defunct} -> {}", mapping.canonical_key);
            renames.insert(defunct, mapping.canonical_key.clone());
        }
    }
    Ok(RenameMap { renames })
}

/// Canonical mappings of the actionable groups, after checking that every key
/// is claimed by exactly one value across all groups.
pub(crate) fn resolve_mappings(
    groups: &[DuplicateGroup],
    selector: &CanonicalSelector,
) -> Result<Vec<CanonicalMapping>> {
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for group in groups {
        let mut seen: HashSet<&str> = HashSet::new();
        for key in group.keys() {
            if !seen.insert(key.as_str()) {
                continue;
            }
            if let Some(previous) = owners.insert(key.as_str(), group.value()) {
                return Err(MergeError::conflict(key.clone(), previous, group.value()));
            }
        }
    }

    Ok(groups
        .iter()
        .filter(|group| group.is_actionable())
        .map(|group| selector.mapping(group))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DuplicateIndex;
    use pretty_assertions::assert_eq;
    use resmerge_table::ResourceEntry;

    #[test]
    fn renames_defunct_keys_to_canonical() {
        let table = vec![
            ResourceEntry::new("OkButton", "OK"),
            ResourceEntry::new("CommonOk", "OK"),
            ResourceEntry::new("Confirm", "OK"),
            ResourceEntry::new("Title", "Main"),
        ];
        let index = DuplicateIndex::build(&table);

        let renames = plan_renames(index.groups(), &CanonicalSelector::default()).unwrap();

        let pairs: Vec<(&str, &str)> = renames.iter().collect();
        assert_eq!(
            pairs,
            vec![("Confirm", "CommonOk"), ("OkButton", "CommonOk")]
        );
    }

    #[test]
    fn single_key_groups_produce_no_renames() {
        let groups = vec![
            DuplicateGroup::new("A", ["KeyA"]).unwrap(),
            DuplicateGroup::new("B", ["KeyB"]).unwrap(),
        ];
        let renames = plan_renames(&groups, &CanonicalSelector::default()).unwrap();
        assert!(renames.is_empty());
    }

    #[test]
    fn same_defunct_key_from_two_groups_conflicts() {
        let groups = vec![
            DuplicateGroup::new("first", ["CommonFirst", "Legacy"]).unwrap(),
            DuplicateGroup::new("second", ["CommonSecond", "Legacy"]).unwrap(),
        ];

        let err = plan_renames(&groups, &CanonicalSelector::default()).unwrap_err();
        assert!(matches!(err, MergeError::Conflict { ref key, .. } if key == "Legacy"));
    }

    #[test]
    fn explicit_pairs() {
        let map = RenameMap::try_from_pairs([("OldKey1", "NewKey"), ("OldKey2", "NewKey")]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("OldKey2"), Some("NewKey"));
        assert_eq!(map.get("NewKey"), None);

        assert!(RenameMap::try_from_pairs([("A", "B"), ("A", "C")]).is_err());
        assert!(RenameMap::try_from_pairs([("A", "B"), ("B", "C")]).is_err());
    }
}
