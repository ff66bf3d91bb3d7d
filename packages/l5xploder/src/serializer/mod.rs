//! Custom serializers that store part of a node outside the backend format.

mod structured_text;

pub use structured_text::StructuredTextSerializer;

use std::path::Path;

use crate::error::Result;
use crate::persistence::ElementFile;
use crate::tree::Node;

/// Encoder/decoder for one node family stored in its own file format.
pub trait CustomSerializer: Send + Sync {
    /// Short name used in logs and debug output.
    fn name(&self) -> &'static str;

    /// Produce the files for `node`; `base_path` is the node's relative path
    /// without extension. May return zero, one or many files.
    fn serialize(&self, node: &Node, base_path: &str) -> Result<Vec<ElementFile>>;

    /// Rebuild nodes from the files this serializer owns in `folder`.
    fn deserialize(&self, folder: &Path) -> Result<Vec<Node>>;
}
