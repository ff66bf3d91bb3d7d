//! Reassembling a document from an exploded tree.

use rayon::prelude::*;

use crate::config::{cmp_ignore_case, join_rel};
use crate::error::{PloderError, Result};
use crate::persistence::ExplodedStore;
use crate::schema::{SplitRule, SplitSchema};
use crate::tree::{Document, Node};

/// Rebuilds a document from the root shell and the files of a
/// [`SplitSchema`].
///
/// Without a sort, nodes of one rule come back in ordinal-ignore-case order
/// of their file names, after any nodes rebuilt by custom serializers.
#[derive(Debug, Clone)]
pub struct Imploder {
    schema: SplitSchema,
}

impl Imploder {
    /// Create an imploder for `schema`.
    #[must_use]
    pub fn new(schema: SplitSchema) -> Self {
        Self { schema }
    }

    /// Load the document stored in `store`.
    pub fn implode(&self, store: &ExplodedStore) -> Result<Document> {
        let mut document = store.load_root()?;
        if document.root.name != self.schema.root_name() {
            return Err(PloderError::InvalidRoot {
                expected: self.schema.root_name().to_string(),
                found: document.root.name,
            });
        }

        self.implode_rules(&mut document.root, self.schema.rules(), "", store)?;
        tracing::info!(path = %store.root_dir().display(), "Imploded document");
        Ok(document)
    }

    fn implode_rules(
        &self,
        target: &mut Node,
        rules: &[SplitRule],
        relative_dir: &str,
        store: &ExplodedStore,
    ) -> Result<()> {
        let options = *store.options();

        for rule in rules {
            let Some(parent) = rule.selector.parent().select_first_mut(target) else {
                tracing::debug!(rule = %rule.selector, "No parent node, skipping rule");
                continue;
            };
            let folder = join_rel(relative_dir, &rule.folder.resolve(parent));
            if !store.directory_exists(&folder) {
                tracing::debug!(rule = %rule.selector, folder = %folder, "No folder, skipping rule");
                continue;
            }

            let mut nodes = store.load_custom(&folder, &rule.serializers)?;
            let mut loaded = if rule.has_children() {
                self.load_owned(rule, &folder, store)?
            } else {
                load_flat(&folder, store)?
            };
            loaded.sort_by(|a, b| cmp_ignore_case(&a.0, &b.0));
            nodes.extend(loaded.into_iter().map(|(_, node)| node));

            for node in &mut nodes {
                for transformer in &rule.transformers {
                    transformer.untransform(node, &options)?;
                }
            }

            let nodes = match &rule.sort {
                Some(sort) => sort.sort(nodes)?,
                None => nodes,
            };
            tracing::debug!(rule = %rule.selector, folder = %folder, nodes = nodes.len(), "Spliced nodes");
            parent.children.extend(nodes);
        }
        Ok(())
    }

    /// Nodes that own a subfolder: `<folder>/<S>/<S>.<ext>` for every
    /// subdirectory `S`, with the nested rules applied inside it.
    fn load_owned(
        &self,
        rule: &SplitRule,
        folder: &str,
        store: &ExplodedStore,
    ) -> Result<Vec<(String, Node)>> {
        let mut candidates = Vec::new();
        for subdir in store.subdirectories(folder)? {
            let owned = join_rel(folder, &subdir);
            let wanted = subdir.to_uppercase();
            match store
                .base_files(&owned)?
                .into_iter()
                .find(|name| name.to_uppercase() == wanted)
            {
                Some(name) => candidates.push((subdir, owned, name)),
                None => tracing::debug!(folder = %owned, "No node file, skipping folder"),
            }
        }

        store.install(|| {
            candidates
                .par_iter()
                .map(|(subdir, owned, name)| -> Result<(String, Node)> {
                    let mut node = store.load_node(&join_rel(owned, name))?;
                    self.implode_rules(&mut node, &rule.children, owned, store)?;
                    Ok((subdir.clone(), node))
                })
                .collect()
        })
    }
}

fn load_flat(folder: &str, store: &ExplodedStore) -> Result<Vec<(String, Node)>> {
    let names = store.base_files(folder)?;
    store.install(|| {
        names
            .par_iter()
            .map(|name| {
                store
                    .load_node(&join_rel(folder, name))
                    .map(|node| (name.clone(), node))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explode::Exploder;
    use crate::options::SerializationOptions;
    use crate::schema::SplitRule;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn items_schema() -> SplitSchema {
        SplitSchema::new([SplitRule::new("Items/*").with_folder("Items")]).with_root_name("Root")
    }

    fn item(name: &str) -> Node {
        Node::new("Item").with_attribute("Name", name)
    }

    #[test]
    fn test_items_come_back_in_name_order() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let doc = Document::new(
            Node::new("Root").with_child(
                Node::new("Items")
                    .with_child(item("C"))
                    .with_child(item("a"))
                    .with_child(item("B")),
            ),
        );
        Exploder::new(items_schema()).explode(doc, &store).unwrap();

        let rebuilt = Imploder::new(items_schema()).implode(&store).unwrap();
        let names: Vec<_> = rebuilt.root.children[0]
            .children
            .iter()
            .filter_map(|n| n.attribute("Name"))
            .collect();
        assert_eq!(names, vec!["a", "B", "C"]);
    }

    #[test]
    fn test_missing_folder_skips_rule() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let doc = Document::new(Node::new("Root").with_child(Node::new("Items")));
        Exploder::new(items_schema()).explode(doc.clone(), &store).unwrap();

        let rebuilt = Imploder::new(items_schema()).implode(&store).unwrap();
        assert_eq!(rebuilt.root, doc.root);
    }

    #[test]
    fn test_subfolder_without_node_file_ignored() {
        let schema = SplitSchema::new([SplitRule::new("Items/*")
            .with_folder("Items")
            .with_children([SplitRule::new("Parts/*").with_folder("Parts")])])
        .with_root_name("Root");
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let doc = Document::new(
            Node::new("Root").with_child(
                Node::new("Items").with_child(item("Pump").with_child(Node::new("Parts"))),
            ),
        );
        Exploder::new(schema.clone()).explode(doc.clone(), &store).unwrap();
        std::fs::create_dir_all(store.root_dir().join("Items").join("Notes")).unwrap();

        let rebuilt = Imploder::new(schema).implode(&store).unwrap();
        assert_eq!(rebuilt.root, doc.root);
    }

    #[test]
    fn test_wrong_root_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let doc = Document::new(Node::new("Root").with_child(Node::new("Items")));
        Exploder::new(items_schema()).explode(doc, &store).unwrap();

        let err = Imploder::new(crate::schema::create_l5x_schema())
            .implode(&store)
            .unwrap_err();
        assert!(matches!(err, PloderError::InvalidRoot { .. }));
    }
}
