//! Reversible node transformations applied around storage.
//!
//! A transformer strips information that can be recomputed from the tree
//! shape before a node is written, and restores it after the node is read.

mod rung_numbers;
mod volatile;

pub use rung_numbers::RungNumberTransformer;
pub use volatile::VolatileMetadataTransformer;

use crate::error::Result;
use crate::options::SerializationOptions;
use crate::tree::Node;

/// Pre-store / post-load hook for one node family.
pub trait NodeTransformer: Send + Sync {
    /// Short name used in logs and debug output.
    fn name(&self) -> &'static str;

    /// Remove derivable information before the node is stored.
    fn transform(&self, node: &mut Node, options: &SerializationOptions) -> Result<()>;

    /// Restore what [`NodeTransformer::transform`] removed.
    fn untransform(&self, node: &mut Node, options: &SerializationOptions) -> Result<()>;
}
