use crate::error::{Result, TableError};
use crate::format::{read_table_text, ResourceTable};
use crate::types::ResourceEntry;
use crate::write::write_atomic;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Flat JSON object table: `{ "Key": "Value", ... }`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTable;

impl ResourceTable for JsonTable {
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>> {
        let text = read_table_text(path)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        // serde_json keeps the last of repeated keys; scan raw pairs to catch them.
        let raw = parse_pairs(text).map_err(|err| TableError::parse(path, err))?;

        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let Value::String(value) = value else {
                return Err(TableError::parse(
                    path,
                    format!("value of '{key}' is not a string"),
                ));
            };
            if !seen.insert(key.clone()) {
                return Err(TableError::duplicate_key(path, key));
            }
            entries.push(ResourceEntry { key, value });
        }

        log::debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<()> {
        let mut object = Map::with_capacity(entries.len());
        for entry in entries {
            object.insert(entry.key.clone(), Value::String(entry.value.clone()));
        }

        // keep the signature of the file being replaced
        let mut bytes = if starts_with_bom(path)? {
            UTF8_BOM.to_vec()
        } else {
            Vec::new()
        };
        serde_json::to_writer_pretty(&mut bytes, &Value::Object(object))
            .map_err(|err| TableError::parse(path, err.to_string()))?;
        bytes.push(b'\n');
        write_atomic(path, &bytes)?;
        Ok(())
    }
}

fn starts_with_bom(path: &Path) -> Result<bool> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    let mut head = Vec::with_capacity(UTF8_BOM.len());
    file.take(UTF8_BOM.len() as u64).read_to_end(&mut head)?;
    Ok(head == UTF8_BOM)
}

/// Parse a top-level object into its key/value pairs, repeats included
fn parse_pairs(text: &str) -> std::result::Result<Vec<(String, Value)>, String> {
    struct Pairs(Vec<(String, Value)>);

    impl<'de> serde::Deserialize<'de> for Pairs {
        fn deserialize<D: serde::Deserializer<'de>>(
            deserializer: D,
        ) -> std::result::Result<Self, D::Error> {
            struct PairsVisitor;

            impl<'de> serde::de::Visitor<'de> for PairsVisitor {
                type Value = Pairs;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("a flat JSON object")
                }

                fn visit_map<A: serde::de::MapAccess<'de>>(
                    self,
                    mut map: A,
                ) -> std::result::Result<Pairs, A::Error> {
                    let mut pairs = Vec::new();
                    while let Some((key, value)) = map.next_entry::<String, Value>()? {
                        pairs.push((key, value));
                    }
                    Ok(Pairs(pairs))
                }
            }

            deserializer.deserialize_map(PairsVisitor)
        }
    }

    serde_json::from_str::<Pairs>(text)
        .map(|pairs| pairs.0)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_entries_in_document_order() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("en.json");
        fs::write(&path, r#"{"Zeta": "Z", "Alpha": "A", "Mid": "Z"}"#).unwrap();

        let entries = JsonTable.load(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                ResourceEntry::new("Zeta", "Z"),
                ResourceEntry::new("Alpha", "A"),
                ResourceEntry::new("Mid", "Z"),
            ]
        );
    }

    #[test]
    fn rejects_repeated_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("en.json");
        fs::write(&path, r#"{"A": "1", "A": "2"}"#).unwrap();

        let err = JsonTable.load(&path).unwrap_err();
        assert!(matches!(err, TableError::DuplicateKey { ref key, .. } if key == "A"));
    }

    #[test]
    fn rejects_nested_values() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("en.json");
        fs::write(&path, r#"{"A": {"nested": "x"}}"#).unwrap();

        assert!(JsonTable.load(&path).unwrap_err().is_parse_failure());
    }

    #[test]
    fn save_keeps_order_and_trailing_newline() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("en.json");
        let entries = vec![ResourceEntry::new("B", "two"), ResourceEntry::new("A", "one")];

        JsonTable.save(&path, &entries).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"B\": \"two\",\n  \"A\": \"one\"\n}\n");
        assert_eq!(JsonTable.load(&path).unwrap(), entries);
    }

    #[test]
    fn save_keeps_existing_bom() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("en.json");
        fs::write(&path, "\u{feff}{\"A\": \"1\", \"B\": \"1\"}").unwrap();

        let entries = JsonTable.load(&path).unwrap();
        JsonTable.save(&path, &entries[..1]).unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(&written[..3], UTF8_BOM);
        assert_eq!(&written[3..], b"{\n  \"A\": \"1\"\n}\n");
        assert_eq!(JsonTable.load(&path).unwrap(), entries[..1].to_vec());
    }
}
