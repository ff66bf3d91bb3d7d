//! Split rules.

use std::fmt;
use std::sync::Arc;

use super::sort::NodeSorter;
use crate::config::{sanitize_file_name, UNNAMED_ELEMENT};
use crate::serializer::CustomSerializer;
use crate::transform::NodeTransformer;
use crate::tree::{Node, PathSelector};

/// How a folder or file name is derived from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameStrategy {
    /// A constant name. An empty name means "no extra path segment".
    Fixed(String),
    /// The value of an attribute, or `fallback` when it is missing or blank.
    FromAttribute { attribute: String, fallback: String },
}

impl NameStrategy {
    /// Constant name.
    #[must_use]
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    /// Attribute value with the `unnamed_element` fallback.
    #[must_use]
    pub fn attribute(attribute: impl Into<String>) -> Self {
        Self::FromAttribute {
            attribute: attribute.into(),
            fallback: UNNAMED_ELEMENT.to_string(),
        }
    }

    /// Resolve against `node` and make the result filesystem-safe.
    ///
    /// # Examples
    /// ```
    /// use l5xploder::schema::NameStrategy;
    /// use l5xploder::tree::Node;
    ///
    /// let tag = Node::new("Tag").with_attribute("Name", "Local:1:I");
    /// assert_eq!(NameStrategy::attribute("Name").resolve(&tag), "Local_1_I");
    /// assert_eq!(NameStrategy::attribute("Alias").resolve(&tag), "unnamed_element");
    /// assert_eq!(NameStrategy::fixed("Tags").resolve(&tag), "Tags");
    /// ```
    #[must_use]
    pub fn resolve(&self, node: &Node) -> String {
        match self {
            NameStrategy::Fixed(name) if name.is_empty() => String::new(),
            NameStrategy::Fixed(name) => sanitize_file_name(name),
            NameStrategy::FromAttribute {
                attribute,
                fallback,
            } => match node.attribute(attribute) {
                Some(value) if !value.trim().is_empty() => sanitize_file_name(value),
                _ => sanitize_file_name(fallback),
            },
        }
    }
}

impl From<&str> for NameStrategy {
    fn from(name: &str) -> Self {
        Self::fixed(name)
    }
}

/// Maps one node family to folders and files.
///
/// `base_name` is resolved against each matched node; `folder` against the
/// matched node's parent. A rule with `children` makes each matched node own
/// a subfolder named after its base name, holding the node file and the
/// folders of the nested rules.
#[derive(Clone)]
pub struct SplitRule {
    pub selector: PathSelector,
    pub folder: NameStrategy,
    pub base_name: NameStrategy,
    pub sort: Option<Arc<dyn NodeSorter>>,
    pub serializers: Vec<Arc<dyn CustomSerializer>>,
    pub transformers: Vec<Arc<dyn NodeTransformer>>,
    pub children: Vec<SplitRule>,
}

impl SplitRule {
    /// Create a rule for the nodes matched by `selector`, stored next to the
    /// parent's folder and named after their `Name` attribute.
    #[must_use]
    pub fn new(selector: impl Into<PathSelector>) -> Self {
        Self {
            selector: selector.into(),
            folder: NameStrategy::fixed(""),
            base_name: NameStrategy::attribute("Name"),
            sort: None,
            serializers: Vec::new(),
            transformers: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the folder strategy.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<NameStrategy>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set the base name strategy.
    #[must_use]
    pub fn with_base_name(mut self, base_name: impl Into<NameStrategy>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set the reassembly order.
    #[must_use]
    pub fn with_sort(mut self, sort: impl NodeSorter + 'static) -> Self {
        self.sort = Some(Arc::new(sort));
        self
    }

    /// Add a custom serializer.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl CustomSerializer + 'static) -> Self {
        self.serializers.push(Arc::new(serializer));
        self
    }

    /// Add a transformer; transformers run in the order they are added.
    #[must_use]
    pub fn with_transformer(mut self, transformer: impl NodeTransformer + 'static) -> Self {
        self.transformers.push(Arc::new(transformer));
        self
    }

    /// Set the nested rules.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = SplitRule>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Whether matched nodes own a subfolder.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl fmt::Debug for SplitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitRule")
            .field("selector", &self.selector.to_string())
            .field("folder", &self.folder)
            .field("base_name", &self.base_name)
            .field("sort", &self.sort.as_ref().map(|s| s.name().to_string()))
            .field(
                "serializers",
                &self.serializers.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field(
                "transformers",
                &self.transformers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DependencySort;
    use crate::transform::RungNumberTransformer;

    #[test]
    fn test_defaults() {
        let rule = SplitRule::new("Items/*");
        assert_eq!(rule.selector.to_string(), "Items/*");
        assert_eq!(rule.folder, NameStrategy::Fixed(String::new()));
        assert_eq!(rule.base_name, NameStrategy::attribute("Name"));
        assert!(!rule.has_children());
        assert!(rule.sort.is_none());
    }

    #[test]
    fn test_builder() {
        let rule = SplitRule::new("Controller/Programs/*")
            .with_folder("Programs")
            .with_sort(DependencySort::by_attribute("Programs", "Parent"))
            .with_transformer(RungNumberTransformer)
            .with_children([SplitRule::new("Tags/*").with_folder("Tags")]);

        assert!(rule.has_children());
        assert_eq!(rule.transformers.len(), 1);
        let debug = format!("{rule:?}");
        assert!(debug.contains("rung-numbers"));
        assert!(debug.contains("\"Programs\""));
    }

    #[test]
    fn test_blank_attribute_uses_fallback() {
        let strategy = NameStrategy::FromAttribute {
            attribute: "Name".to_string(),
            fallback: "Unknown".to_string(),
        };
        assert_eq!(strategy.resolve(&Node::new("Tag").with_attribute("Name", " ")), "Unknown");
    }

    #[test]
    fn test_empty_fixed_folder() {
        assert_eq!(NameStrategy::fixed("").resolve(&Node::new("Root")), "");
    }
}
