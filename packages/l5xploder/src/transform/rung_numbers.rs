//! Ladder rung numbering.

use super::NodeTransformer;
use crate::error::{PloderError, Result};
use crate::options::SerializationOptions;
use crate::tree::Node;

const RLL_CONTENT: &str = "RLLContent";
const RUNG: &str = "Rung";
const NUMBER: &str = "Number";

/// Drops the positional `Number` of every `Rung` and regenerates it on load.
///
/// Inserting one rung would otherwise renumber every rung after it and
/// show up as a diff on all of them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RungNumberTransformer;

impl NodeTransformer for RungNumberTransformer {
    fn name(&self) -> &'static str {
        "rung-numbers"
    }

    fn transform(&self, node: &mut Node, _options: &SerializationOptions) -> Result<()> {
        let owner = node.attribute("Name").unwrap_or_default().to_string();
        for content in node.children_named_mut(RLL_CONTENT) {
            for (index, rung) in content.children_named_mut(RUNG).enumerate() {
                let expected = index.to_string();
                match rung.attribute(NUMBER) {
                    Some(number) if number == expected => {}
                    Some(number) => {
                        return Err(PloderError::Consistency {
                            context: format!("rung numbering in '{owner}'"),
                            message: format!(
                                "Rung at index {index} has Number='{number}', expected '{expected}'"
                            ),
                        })
                    }
                    None => {
                        return Err(PloderError::Consistency {
                            context: format!("rung numbering in '{owner}'"),
                            message: format!("Rung at index {index} is missing the Number attribute"),
                        })
                    }
                }
                rung.attributes.remove(NUMBER);
            }
        }
        Ok(())
    }

    fn untransform(&self, node: &mut Node, _options: &SerializationOptions) -> Result<()> {
        for content in node.children_named_mut(RLL_CONTENT) {
            for (index, rung) in content.children_named_mut(RUNG).enumerate() {
                rung.attributes.set_first(NUMBER, index.to_string());
            }
        }
        Ok(())
    }
}
