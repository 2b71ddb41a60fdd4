use crate::config::DEFAULT_CANONICAL_MARKER;
use crate::index::DuplicateGroup;
use serde::Serialize;

/// Picks the surviving key of a duplicate group.
///
/// The first key containing the marker wins; without one, the earliest key
/// wins. Same input order, same answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSelector {
    marker: String,
}

impl Default for CanonicalSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CANONICAL_MARKER)
    }
}

impl CanonicalSelector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// `None` only for an empty slice
    pub fn select<'a>(&self, keys: &'a [String]) -> Option<&'a str> {
        keys.iter()
            .find(|key| key.contains(self.marker.as_str()))
            .or_else(|| keys.first())
            .map(String::as_str)
    }

    /// Canonical key and the keys it replaces
    pub fn mapping(&self, group: &DuplicateGroup) -> CanonicalMapping {
        let keys = group.keys();
        // groups are never empty
        let canonical = self.select(keys).unwrap_or(keys[0].as_str()).to_string();
        let defunct_keys = keys
            .iter()
            .filter(|key| **key != canonical)
            .cloned()
            .collect();

        CanonicalMapping {
            value: group.value().to_string(),
            canonical_key: canonical,
            defunct_keys,
        }
    }
}

/// [`CanonicalSelector::select`] with the default `"Common"` marker
pub fn select_canonical_key(keys: &[String]) -> Option<&str> {
    let selector = CanonicalSelector::default();
    selector.select(keys)
}

/// Outcome of canonical selection for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalMapping {
    pub value: String,
    pub canonical_key: String,
    /// Group keys minus the canonical one, in group order; empty iff the
    /// group was not actionable
    pub defunct_keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn prefers_common_key() {
        assert_eq!(
            select_canonical_key(&keys(&["Foo", "CommonBar", "Baz"])),
            Some("CommonBar")
        );
    }

    #[test]
    fn falls_back_to_first_key() {
        assert_eq!(
            select_canonical_key(&keys(&["Foo", "Bar", "Baz"])),
            Some("Foo")
        );
    }

    #[test]
    fn first_common_key_wins_and_match_is_case_sensitive() {
        assert_eq!(
            select_canonical_key(&keys(&["commonA", "XCommon", "CommonY"])),
            Some("XCommon")
        );
        assert_eq!(select_canonical_key(&keys(&["COMMON", "common"])), Some("COMMON"));
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert_eq!(select_canonical_key(&[]), None);
    }

    #[test]
    fn custom_marker() {
        let selector = CanonicalSelector::new("Shared");
        assert_eq!(
            selector.select(&keys(&["CommonA", "SharedA"])),
            Some("SharedA")
        );
    }

    #[test]
    fn mapping_splits_group() {
        let group = DuplicateGroup::new("Save", ["SaveButton", "CommonSave", "SaveMenu"]).unwrap();
        let mapping = CanonicalSelector::default().mapping(&group);

        assert_eq!(mapping.value, "Save");
        assert_eq!(mapping.canonical_key, "CommonSave");
        assert_eq!(mapping.defunct_keys, keys(&["SaveButton", "SaveMenu"]));

        let single = DuplicateGroup::new("Once", ["Only"]).unwrap();
        assert!(CanonicalSelector::default().mapping(&single).defunct_keys.is_empty());
    }
}
