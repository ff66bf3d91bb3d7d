//! Declarative description of how a document is split into files.

mod defaults;
mod rule;
mod sort;

pub use defaults::create_l5x_schema;
pub use rule::{NameStrategy, SplitRule};
pub use sort::{DependencyRef, DependencySort, NodeSorter};

use crate::config::ROOT_ELEMENT_NAME;

/// Top-level rules plus the root element they apply to.
///
/// Rules are walked in declaration order when exploding and imploding.
#[derive(Debug, Clone)]
pub struct SplitSchema {
    root_name: String,
    rules: Vec<SplitRule>,
}

impl SplitSchema {
    /// Create a schema for `RSLogix5000Content` documents.
    #[must_use]
    pub fn new(rules: impl IntoIterator<Item = SplitRule>) -> Self {
        Self {
            root_name: ROOT_ELEMENT_NAME.to_string(),
            rules: rules.into_iter().collect(),
        }
    }

    /// Expect a different root element.
    #[must_use]
    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    #[must_use]
    pub fn rules(&self) -> &[SplitRule] {
        &self.rules
    }
}

impl Default for SplitSchema {
    fn default() -> Self {
        create_l5x_schema()
    }
}
