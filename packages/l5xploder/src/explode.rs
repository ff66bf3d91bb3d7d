//! Splitting a document into an exploded tree.

use std::io::BufRead;

use crate::config::join_rel;
use crate::error::{PloderError, Result};
use crate::options::SerializationOptions;
use crate::persistence::{ElementFile, ExplodedStore};
use crate::registry::PathRegistry;
use crate::schema::{SplitRule, SplitSchema};
use crate::transform::{NodeTransformer, VolatileMetadataTransformer};
use crate::tree::{Document, Node};
use crate::xml::parse_document;

/// State of one explode run.
struct ExplodeRun {
    registry: PathRegistry,
    files: Vec<ElementFile>,
    options: SerializationOptions,
}

/// Walks a document against a [`SplitSchema`], detaching every matched node
/// and turning it into element files.
///
/// What is left of the document after the walk is saved as the root shell.
#[derive(Debug, Clone)]
pub struct Exploder {
    schema: SplitSchema,
}

impl Exploder {
    /// Create an exploder for `schema`.
    #[must_use]
    pub fn new(schema: SplitSchema) -> Self {
        Self { schema }
    }

    /// Parse a document from `reader` and explode it into `store`.
    pub fn explode_reader<R: BufRead>(&self, reader: R, store: &ExplodedStore) -> Result<usize> {
        let document = parse_document(reader)?;
        self.explode(document, store)
    }

    /// Explode `document` into `store`, replacing any previous tree.
    ///
    /// Returns the number of element files written, not counting the root
    /// shell and the options record.
    pub fn explode(&self, mut document: Document, store: &ExplodedStore) -> Result<usize> {
        if document.root.name != self.schema.root_name() {
            return Err(PloderError::InvalidRoot {
                expected: self.schema.root_name().to_string(),
                found: document.root.name,
            });
        }

        let options = *store.options();
        if options.omit_export_date {
            VolatileMetadataTransformer.transform(&mut document.root, &options)?;
        }

        let mut run = ExplodeRun {
            registry: PathRegistry::new(),
            files: Vec::new(),
            options,
        };
        explode_rules(&mut document.root, self.schema.rules(), "", &mut run)?;

        let count = run.files.len();
        store.save(&document, &run.files)?;
        tracing::info!(files = count, "Exploded document");
        Ok(count)
    }
}

fn explode_rules(
    node: &mut Node,
    rules: &[SplitRule],
    relative_dir: &str,
    run: &mut ExplodeRun,
) -> Result<()> {
    for rule in rules {
        let paths = rule.selector.select_paths(node);
        if paths.is_empty() {
            continue;
        }
        tracing::debug!(
            rule = %rule.selector,
            folder = relative_dir,
            matches = paths.len(),
            "Splitting nodes"
        );

        // Folder names come from the parents, which must be read before detaching.
        let folders: Vec<String> = paths
            .iter()
            .map(|path| {
                let parent = path.split_last().and_then(|(_, up)| node.at_path(up));
                parent
                    .map(|parent| rule.folder.resolve(parent))
                    .unwrap_or_default()
            })
            .collect();

        // Last match first, so the remaining index paths stay valid.
        let mut matches: Vec<(String, Node)> = paths
            .iter()
            .zip(folders)
            .rev()
            .filter_map(|(path, folder)| node.detach(path).map(|n| (folder, n)))
            .collect();
        matches.reverse();

        for (folder, matched) in matches {
            explode_node(rule, matched, &join_rel(relative_dir, &folder), run)?;
        }
    }
    Ok(())
}

fn explode_node(rule: &SplitRule, mut node: Node, folder: &str, run: &mut ExplodeRun) -> Result<()> {
    let base = rule.base_name.resolve(&node);

    let folder = if rule.has_children() {
        let owned = join_rel(folder, &base);
        let element_path = join_rel(&owned, &base);
        if run.registry.is_reserved(&element_path) {
            return Err(PloderError::PathCollision { path: element_path });
        }
        explode_rules(&mut node, &rule.children, &owned, run)?;
        owned
    } else {
        folder.to_string()
    };

    for transformer in &rule.transformers {
        transformer.transform(&mut node, &run.options)?;
    }

    if rule.serializers.is_empty() {
        let path = run.registry.find_unreserved(&folder, &base);
        run.files.push(ElementFile::structural(path, node));
        return Ok(());
    }

    let base_path = join_rel(&folder, &base);
    if !run.registry.reserve(&base_path) {
        return Err(PloderError::DuplicateOutput {
            paths: vec![base_path],
        });
    }
    for serializer in &rule.serializers {
        run.files.extend(serializer.serialize(&node, &base_path)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SplitRule;
    use crate::serializer::StructuredTextSerializer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn items_document(names: &[&str]) -> Document {
        let mut items = Node::new("Items");
        for name in names {
            items
                .children
                .push(Node::new("Item").with_attribute("Name", *name));
        }
        Document::new(Node::new("Root").with_child(items))
    }

    fn items_schema() -> SplitSchema {
        SplitSchema::new([SplitRule::new("Items/*").with_folder("Items")]).with_root_name("Root")
    }

    fn run() -> ExplodeRun {
        ExplodeRun {
            registry: PathRegistry::new(),
            files: Vec::new(),
            options: SerializationOptions::default(),
        }
    }

    #[test]
    fn test_matches_detached_in_document_order() {
        let mut doc = items_document(&["C", "A", "B"]);
        let mut run = run();
        explode_rules(&mut doc.root, items_schema().rules(), "", &mut run).unwrap();

        let paths: Vec<_> = run.files.iter().map(ElementFile::base_path).collect();
        assert_eq!(paths, vec!["Items/C", "Items/A", "Items/B"]);
        assert!(doc.root.children[0].children.is_empty());
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let mut doc = items_document(&["Motor", "motor", "Motor"]);
        let mut run = run();
        explode_rules(&mut doc.root, items_schema().rules(), "", &mut run).unwrap();

        let paths: Vec<_> = run.files.iter().map(ElementFile::base_path).collect();
        assert_eq!(paths, vec!["Items/Motor", "Items/motor_1", "Items/Motor_2"]);
    }

    fn st_routine(name: &str) -> Node {
        Node::new("Routine")
            .with_attribute("Name", name)
            .with_attribute("Type", "ST")
            .with_child(
                Node::new("STContent").with_child(
                    Node::new("Line")
                        .with_attribute("Number", "0")
                        .with_cdata("x := 1;"),
                ),
            )
    }

    fn routines_schema() -> SplitSchema {
        SplitSchema::new([SplitRule::new("Routines/*")
            .with_folder("Routines")
            .with_serializer(StructuredTextSerializer)])
        .with_root_name("Root")
    }

    #[test]
    fn test_custom_base_path_clash_is_error() {
        let mut doc = Document::new(Node::new("Root").with_child(
            Node::new("Routines")
                .with_child(st_routine("Calc"))
                .with_child(st_routine("CALC")),
        ));
        let mut run = run();

        let err =
            explode_rules(&mut doc.root, routines_schema().rules(), "", &mut run).unwrap_err();
        match err {
            PloderError::DuplicateOutput { paths } => assert_eq!(paths, vec!["Routines/CALC"]),
            other => panic!("expected duplicate output, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_file_stem_is_trimmed() {
        let mut doc = Document::new(
            Node::new("Root").with_child(Node::new("Routines").with_child(st_routine(" Calc "))),
        );
        let mut run = run();
        explode_rules(&mut doc.root, routines_schema().rules(), "", &mut run).unwrap();

        let paths: Vec<_> = run.files.iter().map(ElementFile::base_path).collect();
        assert_eq!(paths, vec!["Routines/Calc"]);
    }

    #[test]
    fn test_nested_collision_is_error() {
        let schema = SplitSchema::new([SplitRule::new("Items/*")
            .with_folder("Items")
            .with_children([SplitRule::new("Parts/*").with_folder("Parts")])])
        .with_root_name("Root");
        let mut doc = items_document(&["Main", "MAIN"]);
        let mut run = run();

        let err = explode_rules(&mut doc.root, schema.rules(), "", &mut run).unwrap_err();
        match err {
            PloderError::PathCollision { path } => assert_eq!(path, "Items/MAIN/MAIN"),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_rules_use_owned_folder() {
        let schema = SplitSchema::new([SplitRule::new("Items/*")
            .with_folder("Items")
            .with_children([SplitRule::new("Parts/*").with_folder("Parts")])])
        .with_root_name("Root");
        let mut doc = Document::new(
            Node::new("Root").with_child(
                Node::new("Items").with_child(
                    Node::new("Item").with_attribute("Name", "Pump").with_child(
                        Node::new("Parts").with_child(Node::new("Part").with_attribute("Name", "Seal")),
                    ),
                ),
            ),
        );
        let mut run = run();
        explode_rules(&mut doc.root, schema.rules(), "", &mut run).unwrap();

        let paths: Vec<_> = run.files.iter().map(ElementFile::base_path).collect();
        assert_eq!(paths, vec!["Items/Pump/Parts/Seal", "Items/Pump/Pump"]);
        match &run.files[1] {
            ElementFile::Structural { node, .. } => {
                assert_eq!(node.child("Parts").map(|p| p.children.len()), Some(0));
            }
            other => panic!("expected structural file, got {other:?}"),
        }
    }

    #[test]
    fn test_folder_from_parent_attribute() {
        let schema = SplitSchema::new([SplitRule::new("Group/*")
            .with_folder(crate::schema::NameStrategy::attribute("Name"))])
        .with_root_name("Root");
        let mut doc = Document::new(
            Node::new("Root").with_child(
                Node::new("Group")
                    .with_attribute("Name", "North")
                    .with_child(Node::new("Item").with_attribute("Name", "A")),
            ),
        );
        let mut run = run();
        explode_rules(&mut doc.root, schema.rules(), "", &mut run).unwrap();
        assert_eq!(run.files[0].base_path(), "North/A");
    }

    #[test]
    fn test_wrong_root_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let exploder = Exploder::new(crate::schema::create_l5x_schema());

        let err = exploder
            .explode(items_document(&["A"]), &store)
            .unwrap_err();
        assert!(matches!(err, PloderError::InvalidRoot { .. }));
        assert!(!store.root_dir().exists());
    }
}
