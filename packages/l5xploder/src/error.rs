//! Error types for the exploder.
//!
//! Every failure is fatal for the running explode or implode call. Variants
//! carry the relative path or node involved so callers can report it.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the exploder library.
#[derive(Debug, Error)]
pub enum PloderError {
    /// The document root is not the expected element.
    #[error("The document does not have a <{expected}> root element (found <{found}>)")]
    InvalidRoot { expected: String, found: String },

    /// Markup could not be parsed from an input stream.
    #[error("XML parsing failed: {0}")]
    Xml(String),

    /// A stored file could not be parsed by the backend.
    #[error("Failed to parse {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// A node owning a subfolder would reuse an already reserved path.
    #[error("The file {path} already exists and this element type has a child configuration")]
    PathCollision { path: String },

    /// Two element files resolve to the same final path.
    #[error("Duplicate file paths found: {}", .paths.join(", "))]
    DuplicateOutput { paths: Vec<String> },

    /// Positional metadata disagrees with the actual position.
    #[error("Inconsistent {context}: {message}")]
    Consistency { context: String, message: String },

    /// A dependency sort found a cycle.
    #[error("Cyclic dependency detected in {family} at '{node}'")]
    DependencyCycle { family: String, node: String },

    /// Removing a previous exploded tree kept failing.
    #[error("Failed to remove {} after {attempts} attempts: {source}", .path.display())]
    DirectoryCleanup {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// IO error on a known path.
    #[error("IO error on {}: {source}", .path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding of the options record failed.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),

    /// Worker pool could not be started.
    #[error("Failed to create worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The given path is not an L5X file.
    #[error("Invalid L5X path: '{0}'. Expected a file with the .L5X extension")]
    InvalidL5xPath(String),

    /// The target exists and overwriting was not requested.
    #[error("{} already exists. Use --force to overwrite", .0.display())]
    DestinationExists(PathBuf),
}

impl PloderError {
    /// Attach a path to an IO error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for exploder operations.
pub type Result<T> = std::result::Result<T, PloderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_output_lists_all_paths() {
        let err = PloderError::DuplicateOutput {
            paths: vec!["Tags/a.xml".to_string(), "Tags/b.xml".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Duplicate file paths found: Tags/a.xml, Tags/b.xml"
        );
    }

    #[test]
    fn test_invalid_root_display() {
        let err = PloderError::InvalidRoot {
            expected: "RSLogix5000Content".to_string(),
            found: "Root".to_string(),
        };
        assert!(err.to_string().contains("<RSLogix5000Content>"));
        assert!(err.to_string().contains("<Root>"));
    }

    #[test]
    fn test_io_at_includes_path() {
        let err = PloderError::io_at(
            "out/Tags",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("out/Tags"));
        assert!(err.to_string().contains("gone"));
    }
}
