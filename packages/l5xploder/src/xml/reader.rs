//! Markup reader producing [`Document`] trees.

use std::io::BufRead;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;

use crate::error::{PloderError, Result};
use crate::tree::{Content, Declaration, Document, Node};

/// Element whose end tag has not been seen yet.
struct OpenElement {
    node: Node,
    /// Text and CDATA in document order.
    all_text: String,
    /// Text and CDATA without whitespace-only text runs.
    significant_text: String,
    /// CDATA sections only.
    cdata: Option<String>,
    /// Whether plain text other than whitespace was seen.
    has_plain_text: bool,
}

impl OpenElement {
    fn new(node: Node) -> Self {
        Self {
            node,
            all_text: String::new(),
            significant_text: String::new(),
            cdata: None,
            has_plain_text: false,
        }
    }

    fn push_text(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.has_plain_text = true;
            self.significant_text.push_str(text);
        }
        self.all_text.push_str(text);
    }

    fn push_cdata(&mut self, text: &str) {
        self.all_text.push_str(text);
        self.significant_text.push_str(text);
        self.cdata.get_or_insert_with(String::new).push_str(text);
    }

    /// Whitespace-only text runs are layout when they sit next to child
    /// elements or a CDATA section. A leaf holding nothing but whitespace
    /// keeps it as text.
    fn finish(mut self) -> Node {
        let is_leaf = self.node.children.is_empty();
        self.node.content = match self.cdata {
            Some(cdata) if !self.has_plain_text => Some(Content::CData(cdata)),
            _ if self.has_plain_text && is_leaf => Some(Content::Text(self.all_text)),
            _ if self.has_plain_text => Some(Content::Text(self.significant_text)),
            _ if is_leaf && !self.all_text.is_empty() => Some(Content::Text(self.all_text)),
            _ => None,
        };
        self.node
    }
}

/// Parse a complete document from a byte stream.
///
/// # Examples
/// ```
/// use l5xploder::xml::parse_document;
///
/// let doc = parse_document(r#"<Root A="1"><Child><![CDATA[x < y]]></Child></Root>"#.as_bytes()).unwrap();
/// assert_eq!(doc.root.name, "Root");
/// assert_eq!(doc.root.children[0].text(), Some("x < y"));
/// ```
pub fn parse_document<R: BufRead>(input: R) -> Result<Document> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut declaration = None;
    let mut open: Vec<OpenElement> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(PloderError::Xml(format!(
                    "{e} at position {}",
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Decl(decl) => declaration = Some(read_declaration(&decl)?),
            Event::Start(start) => open.push(OpenElement::new(read_start(&start)?)),
            Event::Empty(start) => {
                let node = read_start(&start)?;
                attach(&mut open, &mut root, node)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| PloderError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut open, &mut root, element.finish())?;
            }
            Event::Text(text) => {
                if let Some(element) = open.last_mut() {
                    let text = text.unescape().map_err(xml_err)?;
                    element.push_text(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(element) = open.last_mut() {
                    let text = String::from_utf8(cdata.into_inner().into_owned())
                        .map_err(xml_err)?;
                    element.push_cdata(&text);
                }
            }
            Event::Eof => break,
            // Comments, processing instructions and doctypes are not kept.
            _ => {}
        }
        buf.clear();
    }

    if let Some(element) = open.last() {
        return Err(PloderError::Xml(format!(
            "unexpected end of document inside <{}>",
            element.node.name
        )));
    }

    let root = root.ok_or_else(|| PloderError::Xml("document has no root element".to_string()))?;
    Ok(Document { declaration, root })
}

/// Parse a single node, ignoring any declaration.
pub fn parse_node<R: BufRead>(input: R) -> Result<Node> {
    parse_document(input).map(|doc| doc.root)
}

fn attach(open: &mut [OpenElement], root: &mut Option<Node>, node: Node) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.node.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(PloderError::Xml(format!(
                "multiple root elements (second is <{}>)",
                node.name
            )))
        }
    }
    Ok(())
}

fn read_start(start: &BytesStart<'_>) -> Result<Node> {
    let name = String::from_utf8(start.name().as_ref().to_vec()).map_err(xml_err)?;
    let mut node = Node::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8(attr.key.as_ref().to_vec()).map_err(xml_err)?;
        let value = attr.unescape_value().map_err(xml_err)?;
        node.attributes.set(key, value.into_owned());
    }
    Ok(node)
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration> {
    let version = decl.version().map_err(xml_err)?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(xml_err)?
        .map(|e| String::from_utf8_lossy(&e).into_owned());
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(xml_err)?
        .map(|s| String::from_utf8_lossy(&s).into_owned());
    Ok(Declaration {
        version: String::from_utf8_lossy(&version).into_owned(),
        encoding,
        standalone,
    })
}

fn xml_err(e: impl std::fmt::Display) -> PloderError {
    PloderError::Xml(e.to_string())
}
