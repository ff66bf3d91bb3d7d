//! Output units of an explode run.

use std::collections::HashMap;

use crate::error::{PloderError, Result};
use crate::tree::Node;

/// One file produced by exploding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementFile {
    /// A whole node, encoded by the backend; the backend supplies the extension.
    Structural { base_path: String, node: Node },
    /// Raw content produced by a custom serializer.
    Custom {
        base_path: String,
        extension: String,
        content: String,
    },
}

impl ElementFile {
    /// Create a structural file.
    #[must_use]
    pub fn structural(base_path: impl Into<String>, node: Node) -> Self {
        Self::Structural {
            base_path: base_path.into(),
            node,
        }
    }

    /// Create a custom file.
    #[must_use]
    pub fn custom(
        base_path: impl Into<String>,
        extension: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Custom {
            base_path: base_path.into(),
            extension: extension.into(),
            content: content.into(),
        }
    }

    /// Relative path without extension.
    #[must_use]
    pub fn base_path(&self) -> &str {
        match self {
            ElementFile::Structural { base_path, .. } | ElementFile::Custom { base_path, .. } => {
                base_path
            }
        }
    }

    /// Relative path including the extension.
    #[must_use]
    pub fn final_path(&self, structural_extension: &str) -> String {
        match self {
            ElementFile::Structural { base_path, .. } => format!("{base_path}{structural_extension}"),
            ElementFile::Custom {
                base_path,
                extension,
                ..
            } => format!("{base_path}{extension}"),
        }
    }

    /// Relative folder containing the file (empty for the tree root).
    #[must_use]
    pub fn folder(&self) -> &str {
        self.base_path()
            .rsplit_once('/')
            .map(|(folder, _)| folder)
            .unwrap_or("")
    }
}

/// Fail if two files resolve to the same final path, ignoring case.
///
/// The error lists every offending path, sorted.
pub fn verify_unique_paths(files: &[ElementFile], structural_extension: &str) -> Result<()> {
    let mut seen: HashMap<String, Vec<String>> = HashMap::new();
    for file in files {
        let path = file.final_path(structural_extension);
        seen.entry(path.to_uppercase()).or_default().push(path);
    }

    let mut duplicates: Vec<String> = seen
        .into_values()
        .filter(|paths| paths.len() > 1)
        .flatten()
        .collect();

    if duplicates.is_empty() {
        return Ok(());
    }
    duplicates.sort();
    Err(PloderError::DuplicateOutput { paths: duplicates })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_paths() {
        let structural = ElementFile::structural("Tags/Motor", Node::new("Tag"));
        let custom = ElementFile::custom("Programs/Main/Routines/Logic", ".st", "a := 1;");
        assert_eq!(structural.final_path(".xml"), "Tags/Motor.xml");
        assert_eq!(custom.final_path(".xml"), "Programs/Main/Routines/Logic.st");
        assert_eq!(custom.folder(), "Programs/Main/Routines");
        assert_eq!(ElementFile::custom("Top", ".st", "").folder(), "");
    }

    #[test]
    fn test_unique_paths_pass() {
        let files = vec![
            ElementFile::structural("Tags/A", Node::new("Tag")),
            ElementFile::custom("Tags/A", ".st", ""),
        ];
        assert!(verify_unique_paths(&files, ".xml").is_ok());
    }

    #[test]
    fn test_duplicates_reported_case_insensitively() {
        let files = vec![
            ElementFile::structural("Tags/A", Node::new("Tag")),
            ElementFile::structural("tags/a", Node::new("Tag")),
            ElementFile::structural("Tags/B", Node::new("Tag")),
        ];
        match verify_unique_paths(&files, ".xml") {
            Err(PloderError::DuplicateOutput { paths }) => {
                assert_eq!(paths, vec!["Tags/A.xml", "tags/a.xml"]);
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }
}
