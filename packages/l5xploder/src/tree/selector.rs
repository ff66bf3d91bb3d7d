//! Typed path selectors over the node tree.

use std::fmt;

use super::node::Node;

/// One step of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Children with exactly this type name.
    Name(String),
    /// All children.
    Wildcard,
}

impl Segment {
    fn matches(&self, node: &Node) -> bool {
        match self {
            Segment::Name(name) => node.name == *name,
            Segment::Wildcard => true,
        }
    }
}

/// Ordered list of segments, evaluated child by child from a context node.
///
/// The empty selector selects the context node itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSelector {
    segments: Vec<Segment>,
}

impl PathSelector {
    /// Parse a slash-separated selector such as `"Controller/DataTypes/*"`.
    ///
    /// # Examples
    /// ```
    /// use l5xploder::tree::PathSelector;
    ///
    /// let selector = PathSelector::parse("Controller/Tags/*");
    /// assert_eq!(selector.len(), 3);
    /// assert_eq!(selector.parent().to_string(), "Controller/Tags");
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| match part {
                "*" => Segment::Wildcard,
                name => Segment::Name(name.to_string()),
            })
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Selector for the parent of whatever this selector matches.
    #[must_use]
    pub fn parent(&self) -> PathSelector {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Index paths of all matches below `node`, in document order.
    #[must_use]
    pub fn select_paths(&self, node: &Node) -> Vec<Vec<usize>> {
        let mut results = Vec::new();
        let mut current = Vec::new();
        collect_paths(node, &self.segments, &mut current, &mut results);
        results
    }

    /// All matching nodes below `node`, in document order.
    #[must_use]
    pub fn select<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        self.select_paths(node)
            .iter()
            .filter_map(|path| node.at_path(path))
            .collect()
    }

    /// First match below `node`.
    #[must_use]
    pub fn select_first<'a>(&self, node: &'a Node) -> Option<&'a Node> {
        let path = self.select_paths(node).into_iter().next()?;
        node.at_path(&path)
    }

    /// First match below `node`, mutably.
    pub fn select_first_mut<'a>(&self, node: &'a mut Node) -> Option<&'a mut Node> {
        let path = self.select_paths(node).into_iter().next()?;
        node.at_path_mut(&path)
    }
}

fn collect_paths(
    node: &Node,
    segments: &[Segment],
    current: &mut Vec<usize>,
    results: &mut Vec<Vec<usize>>,
) {
    let Some((segment, rest)) = segments.split_first() else {
        results.push(current.clone());
        return;
    };

    for (index, child) in node.children.iter().enumerate() {
        if segment.matches(child) {
            current.push(index);
            collect_paths(child, rest, current, results);
            current.pop();
        }
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Name(name) => name.as_str(),
                Segment::Wildcard => "*",
            })
            .collect();
        f.write_str(&parts.join("/"))
    }
}

impl From<&str> for PathSelector {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}
