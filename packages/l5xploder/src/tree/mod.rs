//! Generic document tree: typed nodes with ordered attributes and children.

mod node;
mod selector;

pub use node::{Attributes, Content, Declaration, Document, Node};
pub use selector::{PathSelector, Segment};
