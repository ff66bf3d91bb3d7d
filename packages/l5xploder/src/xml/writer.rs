//! Markup writer for [`Document`] trees.
//!
//! Layout is fixed so repeated writes of the same tree are byte-identical:
//! two-space indentation, one element per line, text and CDATA leaves kept
//! on the line of their element. An element holding both text and children
//! is written on a single line.

use std::io::Write;

use quick_xml::escape::{escape, partial_escape};

use crate::tree::{Content, Declaration, Document, Node};

const INDENT: &str = "  ";

/// Layout choices for written markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Put every attribute on its own line.
    pub attribute_per_line: bool,
}

/// Render a document, including its declaration (or the default one).
#[must_use]
pub fn document_to_string(doc: &Document, options: WriteOptions) -> String {
    let mut out = String::new();
    write_declaration(&mut out, doc.declaration.as_ref().unwrap_or(&Declaration::default()));
    write_element(&mut out, &doc.root, 0, options);
    out
}

/// Render a single node as a standalone file with the default declaration.
///
/// # Examples
/// ```
/// use l5xploder::tree::Node;
/// use l5xploder::xml::{node_to_string, WriteOptions};
///
/// let node = Node::new("Tag").with_attribute("Name", "T1");
/// assert_eq!(
///     node_to_string(&node, WriteOptions::default()),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Tag Name=\"T1\" />\n"
/// );
/// ```
#[must_use]
pub fn node_to_string(node: &Node, options: WriteOptions) -> String {
    let mut out = String::new();
    write_declaration(&mut out, &Declaration::default());
    write_element(&mut out, node, 0, options);
    out
}

/// Write a document to a byte sink.
pub fn write_document<W: Write>(
    sink: &mut W,
    doc: &Document,
    options: WriteOptions,
) -> std::io::Result<()> {
    sink.write_all(document_to_string(doc, options).as_bytes())
}

/// Write a single node to a byte sink.
pub fn write_node<W: Write>(sink: &mut W, node: &Node, options: WriteOptions) -> std::io::Result<()> {
    sink.write_all(node_to_string(node, options).as_bytes())
}

fn write_declaration(out: &mut String, decl: &Declaration) {
    out.push_str("<?xml version=\"");
    out.push_str(&decl.version);
    out.push('"');
    if let Some(encoding) = &decl.encoding {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = &decl.standalone {
        out.push_str(" standalone=\"");
        out.push_str(standalone);
        out.push('"');
    }
    out.push_str("?>\n");
}

fn write_element(out: &mut String, node: &Node, depth: usize, options: WriteOptions) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&node.name);

    for (key, value) in node.attributes.iter() {
        if options.attribute_per_line {
            out.push('\n');
            out.push_str(&indent);
            out.push_str(INDENT);
        } else {
            out.push(' ');
        }
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }

    match (&node.content, node.children.is_empty()) {
        (None, true) => out.push_str(" />\n"),
        (Some(content), true) => {
            out.push('>');
            write_content(out, content);
            close_tag(out, &node.name);
        }
        (Some(content), false) => {
            // Added layout would become part of the text, so mixed content stays on one line.
            out.push('>');
            write_content(out, content);
            for child in &node.children {
                write_inline(out, child);
            }
            close_tag(out, &node.name);
        }
        (None, false) => {
            out.push_str(">\n");
            for child in &node.children {
                write_element(out, child, depth + 1, options);
            }
            out.push_str(&indent);
            close_tag(out, &node.name);
        }
    }
}

/// Write an element and its subtree without any indentation or line breaks.
fn write_inline(out: &mut String, node: &Node) {
    out.push('<');
    out.push_str(&node.name);
    for (key, value) in node.attributes.iter() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    if node.content.is_none() && node.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    if let Some(content) = &node.content {
        write_content(out, content);
    }
    for child in &node.children {
        write_inline(out, child);
    }
    out.push_str("</");
    out.push_str(&node.name);
    out.push('>');
}

fn close_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

fn write_content(out: &mut String, content: &Content) {
    match content {
        Content::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Content::CData(text) => {
            out.push_str("<![CDATA[");
            // A literal "]]>" cannot appear inside one section; split it across two.
            out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
    }
}

/// Escape markup characters plus whitespace that parsers would normalize.
fn escape_attribute(value: &str) -> String {
    escape(value)
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
        .replace('\t', "&#x9;")
}
