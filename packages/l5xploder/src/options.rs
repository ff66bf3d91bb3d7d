//! Options record persisted beside an exploded tree.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PloderError, Result};

/// Storage encoding used for element files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    #[default]
    Xml,
    Json,
}

impl SerializationFormat {
    /// Lowercase name as used in the options file.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationFormat::Xml => "xml",
            SerializationFormat::Json => "json",
        }
    }
}

/// How an exploded tree was written.
///
/// Saved on every explode so a later implode can pick the same backend
/// without the caller re-specifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationOptions {
    #[serde(rename = "serialization_format", default)]
    pub format: SerializationFormat,

    /// One attribute per line in markup files.
    #[serde(rename = "xml_attribute_per_line", default)]
    pub pretty_attributes: bool,

    /// Drop export timestamps that change on every export.
    #[serde(default = "default_omit_export_date")]
    pub omit_export_date: bool,
}

fn default_omit_export_date() -> bool {
    true
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self {
            format: SerializationFormat::Xml,
            pretty_attributes: false,
            omit_export_date: true,
        }
    }
}

impl SerializationOptions {
    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Parse from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Write the record to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|e| PloderError::io_at(path, e))
    }

    /// Read the record from `path`, or `None` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let yaml = fs::read_to_string(path).map_err(|e| PloderError::io_at(path, e))?;
        Self::from_yaml(&yaml).map(Some)
    }

    /// Read the record from `path`, falling back to `defaults` when absent.
    pub fn load_or(path: &Path, defaults: Self) -> Result<Self> {
        Ok(Self::load(path)?.unwrap_or(defaults))
    }
}
