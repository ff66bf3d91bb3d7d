//! Export timestamps that change on every export.

use super::NodeTransformer;
use crate::error::Result;
use crate::options::SerializationOptions;
use crate::tree::Node;

/// Removes `ExportDate` from the document root and `LastModifiedDate` from
/// its `Controller` children when `omit_export_date` is set.
///
/// The values are not recoverable, so `untransform` does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatileMetadataTransformer;

impl NodeTransformer for VolatileMetadataTransformer {
    fn name(&self) -> &'static str {
        "volatile-metadata"
    }

    fn transform(&self, node: &mut Node, options: &SerializationOptions) -> Result<()> {
        if !options.omit_export_date {
            return Ok(());
        }
        node.attributes.remove("ExportDate");
        for controller in node.children_named_mut("Controller") {
            controller.attributes.remove("LastModifiedDate");
        }
        Ok(())
    }

    fn untransform(&self, _node: &mut Node, _options: &SerializationOptions) -> Result<()> {
        Ok(())
    }
}
