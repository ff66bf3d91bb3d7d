//! JSON backend.
//!
//! Each node becomes an object with `#type`, and where present `#attributes`
//! (in document order), `#text` or `#cdata`, and `#elements`. The root file
//! additionally carries `#declaration`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::PersistenceBackend;
use crate::config::JSON_FILE_EXTENSION;
use crate::error::{PloderError, Result};
use crate::tree::{Attributes, Content, Declaration, Document, Node};

#[derive(Debug, Serialize, Deserialize)]
struct JsonNode {
    #[serde(rename = "#type")]
    name: String,
    #[serde(rename = "#attributes", default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
    #[serde(rename = "#text", default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "#cdata", default, skip_serializing_if = "Option::is_none")]
    cdata: Option<String>,
    #[serde(rename = "#elements", default, skip_serializing_if = "Vec::is_empty")]
    elements: Vec<JsonNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(rename = "#declaration", default, skip_serializing_if = "Option::is_none")]
    declaration: Option<Declaration>,
    #[serde(rename = "#root")]
    root: JsonNode,
}

impl From<&Node> for JsonNode {
    fn from(node: &Node) -> Self {
        let (text, cdata) = match &node.content {
            Some(Content::Text(text)) => (Some(text.clone()), None),
            Some(Content::CData(text)) => (None, Some(text.clone())),
            None => (None, None),
        };
        Self {
            name: node.name.clone(),
            attributes: node.attributes.clone(),
            text,
            cdata,
            elements: node.children.iter().map(JsonNode::from).collect(),
        }
    }
}

impl From<JsonNode> for Node {
    fn from(json: JsonNode) -> Self {
        let content = match (json.text, json.cdata) {
            (Some(text), _) => Some(Content::Text(text)),
            (None, Some(cdata)) => Some(Content::CData(cdata)),
            (None, None) => None,
        };
        Node {
            name: json.name,
            attributes: json.attributes,
            content,
            children: json.elements.into_iter().map(Node::from).collect(),
        }
    }
}

/// Stores nodes as pretty-printed JSON objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBackend;

impl JsonBackend {
    fn write<T: Serialize>(value: &T, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        fs::write(path, json).map_err(|e| PloderError::io_at(path, e))
    }

    fn read<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
        let json = fs::read_to_string(path).map_err(|e| PloderError::io_at(path, e))?;
        serde_json::from_str(&json).map_err(|e| PloderError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl PersistenceBackend for JsonBackend {
    fn extension(&self) -> &'static str {
        JSON_FILE_EXTENSION
    }

    fn save_root(&self, document: &Document, path: &Path) -> Result<()> {
        let json = JsonDocument {
            declaration: document.declaration.clone(),
            root: JsonNode::from(&document.root),
        };
        Self::write(&json, path)
    }

    fn load_root(&self, path: &Path) -> Result<Document> {
        let json: JsonDocument = Self::read(path)?;
        Ok(Document {
            declaration: json.declaration,
            root: json.root.into(),
        })
    }

    fn save_node(&self, node: &Node, path: &Path) -> Result<()> {
        Self::write(&JsonNode::from(node), path)
    }

    fn load_node(&self, path: &Path) -> Result<Node> {
        Self::read::<JsonNode>(path).map(Node::from)
    }
}
