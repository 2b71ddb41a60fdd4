use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker that makes a key the preferred survivor of its group
pub const DEFAULT_CANONICAL_MARKER: &str = "Common";

/// Configuration of a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Which files of the source tree are candidates for rewriting
    pub scan: ScanConfig,

    /// Case-sensitive substring that marks a key as canonical
    pub canonical_marker: String,

    /// Only replace keys that are not embedded in a longer identifier
    pub whole_identifier: bool,

    /// Write rewritten files through a temp file + rename
    pub atomic_writes: bool,

    /// Abort the run on the first file that cannot be rewritten
    pub fail_fast: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            canonical_marker: DEFAULT_CANONICAL_MARKER.to_string(),
            whole_identifier: false,
            atomic_writes: true,
            fail_fast: false,
        }
    }
}

impl MergeConfig {
    /// Parse a TOML document; missing fields fall back to defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| MergeError::invalid_config(err.to_string()))?;
        config.validate().map_err(MergeError::invalid_config)?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(MergeError::NotFound(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.canonical_marker.is_empty() {
            return Err("canonical_marker must not be empty".to_string());
        }
        self.scan.validate()
    }
}

/// Source tree walk settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions to rewrite, with or without the leading dot
    pub extensions: Vec<String>,

    /// Skip paths matched by .gitignore / .ignore files
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["cs".to_string(), "cshtml".to_string()],
            respect_gitignore: false,
        }
    }
}

impl ScanConfig {
    /// Extensions lowercased and without leading dots
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.normalized_extensions().is_empty() {
            return Err("scan.extensions must list at least one extension".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = MergeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canonical_marker, "Common");
        assert_eq!(config.scan.normalized_extensions(), vec!["cs", "cshtml"]);
        assert!(config.atomic_writes);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MergeConfig::from_toml_str(
            r#"
            whole_identifier = true

            [scan]
            extensions = [".CS", "razor"]
            "#,
        )
        .unwrap();

        assert!(config.whole_identifier);
        assert!(config.atomic_writes);
        assert!(!config.scan.respect_gitignore);
        assert_eq!(config.scan.normalized_extensions(), vec!["cs", "razor"]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = MergeConfig::default();

        config.canonical_marker.clear();
        assert!(config.validate().is_err());

        config.canonical_marker = "Shared".to_string();
        config.scan.extensions = vec![".".to_string(), " ".to_string()];
        assert!(config.validate().is_err());

        config.scan.extensions = vec!["vb".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = MergeConfig::from_toml_str("atomic_writes = \"yes\"").unwrap_err();
        assert!(matches!(err, MergeError::InvalidConfig(_)));

        let err = MergeConfig::from_toml_str("[scan]\nextensions = []").unwrap_err();
        assert!(matches!(err, MergeError::InvalidConfig(_)));
    }
}
