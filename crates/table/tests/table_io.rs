use pretty_assertions::assert_eq;
use resmerge_table::{table_for_path, ResourceEntry, TableError};
use std::fs;
use tempfile::TempDir;

const RESX: &str = "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n<root>\r\n  <data name=\"Ok\" xml:space=\"preserve\">\r\n    <value>OK</value>\r\n  </data>\r\n  <data name=\"CommonOk\" xml:space=\"preserve\">\r\n    <value>OK</value>\r\n    <comment>shared</comment>\r\n  </data>\r\n  <data name=\"Icon\" type=\"System.Resources.ResXFileRef, System.Windows.Forms\">\r\n    <value>icon.png;System.Byte[]</value>\r\n  </data>\r\n  <data name=\"Title\" xml:space=\"preserve\">\r\n    <value>Fish &amp; Chips</value>\r\n  </data>\r\n</root>\r\n";

#[test]
fn resx_save_drops_only_removed_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Strings.resx");
    fs::write(&path, RESX).unwrap();

    let table = table_for_path(&path).unwrap();
    let entries = table.load(&path).unwrap();
    assert_eq!(
        entries,
        vec![
            ResourceEntry::new("Ok", "OK"),
            ResourceEntry::new("CommonOk", "OK"),
            ResourceEntry::new("Title", "Fish & Chips"),
        ]
    );

    table.save(&path, &entries[1..]).unwrap();

    let expected = RESX.replace(
        "  <data name=\"Ok\" xml:space=\"preserve\">\r\n    <value>OK</value>\r\n  </data>\r\n",
        "",
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(table.load(&path).unwrap(), entries[1..].to_vec());
}

#[test]
fn json_save_then_load_keeps_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("strings.JSON");
    fs::write(&path, "{\"Zeta\": \"z\", \"Alpha\": \"a\", \"Mid\": \"z\"}").unwrap();

    let table = table_for_path(&path).unwrap();
    let entries = table.load(&path).unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);

    table.save(&path, &entries[..2]).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\n  \"Zeta\": \"z\",\n  \"Alpha\": \"a\"\n}\n"
    );
}

#[test]
fn unknown_extension_is_rejected() {
    let err = table_for_path("Strings.yaml").err().unwrap();
    assert!(matches!(err, TableError::UnsupportedFormat(_)));
}

#[test]
fn missing_table_is_not_found() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("Missing.resx");
    let err = table_for_path(&path).unwrap().load(&path).unwrap_err();
    assert!(matches!(err, TableError::NotFound(_)));
}
