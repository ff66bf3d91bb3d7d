//! Markup backend.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use super::PersistenceBackend;
use crate::config::XML_FILE_EXTENSION;
use crate::error::{PloderError, Result};
use crate::tree::{Document, Node};
use crate::xml::{document_to_string, node_to_string, parse_document, WriteOptions};

/// Stores nodes as indented markup files.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlBackend {
    options: WriteOptions,
}

impl XmlBackend {
    /// Create a backend; `attribute_per_line` puts each attribute on its own line.
    #[must_use]
    pub fn new(attribute_per_line: bool) -> Self {
        Self {
            options: WriteOptions { attribute_per_line },
        }
    }

    fn read(path: &Path) -> Result<Document> {
        let file = File::open(path).map_err(|e| PloderError::io_at(path, e))?;
        parse_document(BufReader::new(file)).map_err(|e| match e {
            PloderError::Xml(message) => PloderError::Format {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }
}

impl PersistenceBackend for XmlBackend {
    fn extension(&self) -> &'static str {
        XML_FILE_EXTENSION
    }

    fn save_root(&self, document: &Document, path: &Path) -> Result<()> {
        fs::write(path, document_to_string(document, self.options))
            .map_err(|e| PloderError::io_at(path, e))
    }

    fn load_root(&self, path: &Path) -> Result<Document> {
        Self::read(path)
    }

    fn save_node(&self, node: &Node, path: &Path) -> Result<()> {
        fs::write(path, node_to_string(node, self.options)).map_err(|e| PloderError::io_at(path, e))
    }

    fn load_node(&self, path: &Path) -> Result<Node> {
        Self::read(path).map(|doc| doc.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_node_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Tag.xml");
        let node = Node::new("Tag")
            .with_attribute("Name", "Speed")
            .with_attribute("DataType", "REAL")
            .with_child(Node::new("Description").with_cdata("Line speed <m/s>"));

        let backend = XmlBackend::new(true);
        backend.save_node(&node, &path).unwrap();
        assert_eq!(backend.load_node(&path).unwrap(), node);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  Name=\"Speed\""));
    }

    #[test]
    fn test_parse_failure_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.xml");
        fs::write(&path, "<Tag><Open></Tag>").unwrap();

        let err = XmlBackend::default().load_node(&path).unwrap_err();
        match err {
            PloderError::Format { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected format error, got {other:?}"),
        }
    }
}
