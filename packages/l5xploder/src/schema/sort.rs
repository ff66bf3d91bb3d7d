//! Reassembly ordering of sibling nodes.

use std::collections::HashMap;

use crate::error::{PloderError, Result};
use crate::tree::{Node, PathSelector};

/// Orders the nodes of one rule before they are spliced back.
pub trait NodeSorter: Send + Sync {
    /// Short name used in logs and debug output.
    fn name(&self) -> &str;

    /// Return the nodes in their reassembly order.
    fn sort(&self, nodes: Vec<Node>) -> Result<Vec<Node>>;
}

/// Where a node names the siblings it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRef {
    /// An attribute on the node itself, e.g. a module's `ParentModule`.
    Attribute(String),
    /// An attribute on every node reached by `path`, e.g. `DataType` on
    /// `LocalTags/LocalTag` of an add-on instruction.
    ChildAttribute {
        path: PathSelector,
        attribute: String,
    },
}

/// Topological order by `Name`: every node comes after the siblings it
/// references.
///
/// Named nodes are visited in input order. References to unknown names and
/// self references are ignored. Nodes without a `Name`, or with a blank one,
/// cannot be referenced and keep their relative order after all named nodes.
#[derive(Debug, Clone)]
pub struct DependencySort {
    family: String,
    reference: DependencyRef,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

impl DependencySort {
    /// Create a sort for the node family named `family` (used in errors).
    #[must_use]
    pub fn new(family: impl Into<String>, reference: DependencyRef) -> Self {
        Self {
            family: family.into(),
            reference,
        }
    }

    /// Dependencies named by an attribute on the node.
    #[must_use]
    pub fn by_attribute(family: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::new(family, DependencyRef::Attribute(attribute.into()))
    }

    /// Dependencies named by an attribute on descendants at `path`.
    #[must_use]
    pub fn by_child_attribute(
        family: impl Into<String>,
        path: impl Into<PathSelector>,
        attribute: impl Into<String>,
    ) -> Self {
        Self::new(
            family,
            DependencyRef::ChildAttribute {
                path: path.into(),
                attribute: attribute.into(),
            },
        )
    }

    fn dependencies<'a>(&self, node: &'a Node) -> Vec<&'a str> {
        match &self.reference {
            DependencyRef::Attribute(attribute) => node.attribute(attribute).into_iter().collect(),
            DependencyRef::ChildAttribute { path, attribute } => path
                .select(node)
                .into_iter()
                .filter_map(|child| child.attribute(attribute))
                .collect(),
        }
    }

    fn visit(
        &self,
        current: usize,
        nodes: &[Node],
        by_name: &HashMap<&str, usize>,
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<()> {
        match marks[current] {
            Mark::Visited => return Ok(()),
            Mark::Visiting => {
                return Err(PloderError::DependencyCycle {
                    family: self.family.clone(),
                    node: nodes[current].attribute("Name").unwrap_or_default().to_string(),
                })
            }
            Mark::Unvisited => {}
        }

        marks[current] = Mark::Visiting;
        for dependency in self.dependencies(&nodes[current]) {
            match by_name.get(dependency) {
                Some(&target) if target != current => {
                    self.visit(target, nodes, by_name, marks, order)?;
                }
                _ => {}
            }
        }
        marks[current] = Mark::Visited;
        order.push(current);
        Ok(())
    }
}

impl NodeSorter for DependencySort {
    fn name(&self) -> &str {
        &self.family
    }

    fn sort(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let mut named = Vec::new();
        let mut unnamed = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            match node.attribute("Name").filter(|name| !name.trim().is_empty()) {
                Some(name) => {
                    by_name.entry(name).or_insert(index);
                    named.push(index);
                }
                None => unnamed.push(index),
            }
        }

        let mut marks = vec![Mark::Unvisited; nodes.len()];
        let mut order = Vec::with_capacity(nodes.len());
        for index in named {
            self.visit(index, &nodes, &by_name, &mut marks, &mut order)?;
        }
        order.extend(unnamed);
        drop(by_name);

        let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|index| slots.get_mut(index).and_then(Option::take))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(name: &str, parent: &str) -> Node {
        Node::new("Module")
            .with_attribute("Name", name)
            .with_attribute("ParentModule", parent)
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .map(|n| n.attribute("Name").unwrap_or("-"))
            .collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let nodes = vec![module("A", "B"), module("B", "C"), module("C", "C")];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(names(&sorted), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_unnamed_nodes_appended_in_input_order() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let nodes = vec![
            Node::new("Module").with_attribute("Id", "1"),
            module("Child", "Local"),
            Node::new("Module").with_attribute("Id", "2"),
            module("Local", "Local"),
        ];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(names(&sorted), vec!["Local", "Child", "-", "-"]);
        assert_eq!(sorted[2].attribute("Id"), Some("1"));
        assert_eq!(sorted[3].attribute("Id"), Some("2"));
    }

    #[test]
    fn test_blank_name_is_unnamed() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let nodes = vec![
            module("A", ""),
            module("", "A").with_attribute("Id", "empty"),
            module("  ", "A").with_attribute("Id", "blank"),
            module("B", "A"),
        ];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(names(&sorted), vec!["A", "B", "", "  "]);
        assert_eq!(sorted[2].attribute("Id"), Some("empty"));
    }

    #[test]
    fn test_unknown_references_ignored() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let nodes = vec![module("B", "Missing"), module("A", "Missing")];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(names(&sorted), vec!["B", "A"]);
    }

    #[test]
    fn test_cycle_detected() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let err = sort
            .sort(vec![module("A", "B"), module("B", "A")])
            .unwrap_err();
        match err {
            PloderError::DependencyCycle { family, node } => {
                assert_eq!(family, "Modules");
                assert_eq!(node, "A");
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_child_attribute_references() {
        let aoi = |name: &str, types: &[&str]| {
            let mut tags = Node::new("LocalTags");
            for data_type in types {
                tags.children
                    .push(Node::new("LocalTag").with_attribute("DataType", *data_type));
            }
            Node::new("AddOnInstructionDefinition")
                .with_attribute("Name", name)
                .with_child(tags)
        };
        let sort = DependencySort::by_child_attribute(
            "AddOnInstructionDefinitions",
            "LocalTags/LocalTag",
            "DataType",
        );
        let nodes = vec![
            aoi("Outer", &["BOOL", "Inner"]),
            aoi("Inner", &["Base", "DINT"]),
            aoi("Base", &[]),
        ];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(names(&sorted), vec!["Base", "Inner", "Outer"]);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let sort = DependencySort::by_attribute("Modules", "ParentModule");
        let nodes = vec![
            module("X", "Dup"),
            module("Dup", "").with_attribute("Id", "first"),
            module("Dup", "").with_attribute("Id", "second"),
        ];
        let sorted = sort.sort(nodes).unwrap();
        assert_eq!(sorted[0].attribute("Id"), Some("first"));
        assert_eq!(sorted[1].attribute("Name"), Some("X"));
        assert_eq!(sorted[2].attribute("Id"), Some("second"));
    }
}
