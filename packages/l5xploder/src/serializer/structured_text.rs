//! Structured Text routines stored as plain `.st` files.

use std::fs;
use std::path::Path;

use super::CustomSerializer;
use crate::config::{cmp_ignore_case, STRUCTURED_TEXT_FILE_EXTENSION};
use crate::error::{PloderError, Result};
use crate::persistence::ElementFile;
use crate::registry::PathRegistry;
use crate::tree::Node;

const ROUTINE: &str = "Routine";
const ST_CONTENT: &str = "STContent";
const LINE: &str = "Line";
const NUMBER: &str = "Number";
const ONLINE_EDIT_TYPE: &str = "OnlineEditType";

/// Writes each `STContent` of a routine as a text file, one source line per
/// file line, instead of embedding numbered `Line` elements in markup.
///
/// Files are named `<base>.st` for the primary content and
/// `<base>.<OnlineEditType>.st` for online-edit variants. Routines without
/// `STContent` are passed through as a single structural file.
///
/// On load the routine `Name` is taken from the file stem, so a name that
/// needed sanitizing (reserved characters, surrounding spaces) comes back
/// sanitized.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredTextSerializer;

impl CustomSerializer for StructuredTextSerializer {
    fn name(&self) -> &'static str {
        "structured-text"
    }

    fn serialize(&self, node: &Node, base_path: &str) -> Result<Vec<ElementFile>> {
        let contents: Vec<&Node> = node.children_named(ST_CONTENT).collect();
        if contents.is_empty() {
            return Ok(vec![ElementFile::structural(base_path, node.clone())]);
        }

        // Variant file names carry meaning, so clashes fail instead of being renamed.
        let mut registry = PathRegistry::new();
        let mut files = Vec::with_capacity(contents.len());

        for content in contents {
            let file_base = match content.attribute(ONLINE_EDIT_TYPE) {
                Some(variant) => format!("{base_path}.{variant}"),
                None => base_path.to_string(),
            };

            if !registry.reserve(&file_base) {
                return Err(PloderError::DuplicateOutput {
                    paths: vec![format!("{file_base}{STRUCTURED_TEXT_FILE_EXTENSION}")],
                });
            }

            let lines = numbered_lines(content, &file_base)?;
            files.push(ElementFile::custom(
                file_base,
                STRUCTURED_TEXT_FILE_EXTENSION,
                lines.join("\n"),
            ));
        }

        Ok(files)
    }

    fn deserialize(&self, folder: &Path) -> Result<Vec<Node>> {
        let mut routines: Vec<(String, Vec<(Option<String>, String)>)> = Vec::new();

        for (stem, path) in st_files(folder)? {
            let (name, variant) = match stem.split_once('.') {
                Some((name, variant)) if !variant.is_empty() => {
                    (name.to_string(), Some(variant.to_string()))
                }
                Some((name, _)) => (name.to_string(), None),
                None => (stem.clone(), None),
            };
            let text = fs::read_to_string(&path).map_err(|e| PloderError::io_at(&path, e))?;

            match routines.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, variants)) => variants.push((variant, text)),
                None => routines.push((name, vec![(variant, text)])),
            }
        }

        routines.sort_by(|a, b| cmp_ignore_case(&a.0, &b.0));

        let nodes = routines
            .into_iter()
            .map(|(name, mut variants)| {
                // Primary content first, then online-edit variants.
                variants.sort_by(|a, b| match (&a.0, &b.0) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (Some(x), Some(y)) => cmp_ignore_case(x, y),
                });

                let mut routine = Node::new(ROUTINE)
                    .with_attribute("Name", name)
                    .with_attribute("Type", "ST");
                for (variant, text) in variants {
                    routine.children.push(content_node(variant, &text));
                }
                routine
            })
            .collect();

        Ok(nodes)
    }
}

/// Line texts of one `STContent`, after checking the numbering runs 0, 1, 2, ...
fn numbered_lines<'a>(content: &'a Node, file_base: &str) -> Result<Vec<&'a str>> {
    content
        .children_named(LINE)
        .enumerate()
        .map(|(index, line)| {
            let expected = index.to_string();
            let found = line.attribute(NUMBER);
            if found != Some(expected.as_str()) {
                return Err(PloderError::Consistency {
                    context: format!("<{ST_CONTENT}> of {file_base}"),
                    message: format!(
                        "Expected line number {expected}, but found {}",
                        found.unwrap_or("missing")
                    ),
                });
            }
            let text = line.text().unwrap_or_default();
            if text.contains(['\n', '\r']) {
                return Err(PloderError::Consistency {
                    context: format!("<{ST_CONTENT}> of {file_base}"),
                    message: format!("Line {index} contains a line break"),
                });
            }
            Ok(text)
        })
        .collect()
}

fn content_node(variant: Option<String>, text: &str) -> Node {
    let mut content = Node::new(ST_CONTENT);
    if let Some(variant) = variant {
        content.attributes.set(ONLINE_EDIT_TYPE, variant);
    }
    for (index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        content.children.push(
            Node::new(LINE)
                .with_attribute(NUMBER, index.to_string())
                .with_cdata(line),
        );
    }
    content
}

/// `(stem, path)` of every `.st` file directly in `folder`, sorted by stem.
fn st_files(folder: &Path) -> Result<Vec<(String, std::path::PathBuf)>> {
    let extension = STRUCTURED_TEXT_FILE_EXTENSION.trim_start_matches('.');
    let entries = fs::read_dir(folder).map_err(|e| PloderError::io_at(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PloderError::io_at(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_st = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        let stem = path.file_stem().and_then(|s| s.to_str()).map(str::to_string);
        match stem {
            Some(stem) if is_st && !stem.is_empty() => files.push((stem, path)),
            _ => {}
        }
    }
    files.sort_by(|a, b| cmp_ignore_case(&a.0, &b.0));
    Ok(files)
}
