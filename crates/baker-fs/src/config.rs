//! Format-agnostic configuration loading

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result, io};

/// Configuration file reader.
///
/// Detects the format from the file extension and deserializes
/// transparently. YAML is the native format; JSON is accepted for tooling
/// that generates configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.yaml`, `.yml` -> YAML
    /// - `.json` -> JSON
    pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Self::parse_yaml(path, &content),
            "json" => serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Parse YAML content, attributing errors to `path`.
    pub fn parse_yaml<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "YAML".into(),
            message: e.to_string(),
        })
    }
}
