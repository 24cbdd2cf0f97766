//! A minimal XML element tree.
//!
//! Just enough DOM to edit Maven `settings.xml`: elements, attributes, text,
//! comments and the prolog survive a read/write cycle. Text is kept as
//! written, except whitespace-only runs between child elements or comments:
//! those are layout, and the writer re-indents the whole document.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node inside an element or around the root.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    /// Comment body, kept escaped as read.
    Comment(String),
    /// Declarations, processing instructions and doctypes, written back verbatim.
    Raw(Event<'static>),
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An element whose only child is `text`.
    pub fn with_text(name: impl Into<String>, text: &str) -> Self {
        let mut element = Element::new(name);
        element.set_text(text);
        element
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// First child element called `name`, appended if there is none.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name));
        let index = existing.unwrap_or_else(|| {
            self.children.push(Node::Element(Element::new(name)));
            self.children.len() - 1
        });
        match &mut self.children[index] {
            Node::Element(e) => e,
            _ => unreachable!("index points at an element"),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Concatenated text and CDATA content of this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Remove indentation text from an element that holds markup. Leaf
    /// elements keep their text, whitespace included.
    fn drop_layout_whitespace(&mut self) {
        let has_markup = self
            .children
            .iter()
            .any(|node| !matches!(node, Node::Text(_) | Node::CData(_)));
        if has_markup {
            self.children
                .retain(|node| !matches!(node, Node::Text(t) if t.trim().is_empty()));
        }
    }
}

/// A parsed document: nodes before the root, the root, nodes after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse `content`. Errors are returned as messages for the caller to
    /// attach a path to.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(content);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                format!("{} at position {}", e, reader.error_position())
            })?;

            let node = match event {
                Event::Start(start) => {
                    stack.push(element_from(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| "unexpected closing tag".to_string())?;
                    element.drop_layout_whitespace();
                    Node::Element(element)
                }
                Event::Empty(start) => Node::Element(element_from(&start)?),
                Event::Text(text) => Node::Text(text.unescape().map_err(|e| e.to_string())?.into_owned()),
                Event::CData(data) => Node::CData(String::from_utf8_lossy(&data).into_owned()),
                Event::Comment(text) => Node::Comment(String::from_utf8_lossy(&text).into_owned()),
                Event::Eof => break,
                other => Node::Raw(other.into_owned()),
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }
            match node {
                Node::Element(element) if root.is_none() => root = Some(element),
                Node::Element(element) => {
                    return Err(format!("more than one root element (found <{}>)", element.name))
                }
                Node::Text(_) | Node::CData(_) => {}
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        let root = root.ok_or_else(|| "document has no root element".to_string())?;
        Ok(Document {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize with `indent` spaces per level and a trailing newline.
    pub fn to_string_indented(&self, indent: usize) -> Result<String, String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        let mut out = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
        out.push('\n');
        Ok(out)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, String> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), String> {
    let event = match node {
        Node::Element(element) => return write_element(writer, element),
        Node::Text(text) => Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))),
        Node::CData(data) => Event::CData(BytesCData::new(data.as_str())),
        Node::Comment(body) => Event::Comment(BytesText::from_escaped(body.as_str())),
        Node::Raw(event) => event.clone(),
    };
    writer.write_event(event).map_err(|e| e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), String> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| e.to_string());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| e.to_string())?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| e.to_string())
}
