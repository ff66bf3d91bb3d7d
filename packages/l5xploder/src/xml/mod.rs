//! Markup codec between L5X text and the node tree.

mod reader;
mod writer;

pub use reader::{parse_document, parse_node};
pub use writer::{document_to_string, node_to_string, write_document, write_node, WriteOptions};
