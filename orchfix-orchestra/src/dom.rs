/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Owned XML element tree.
//!
//! The reconciler mutates the parsed reference document in place and
//! re-serializes it, so the tree keeps everything it reads: element and
//! attribute names verbatim (namespace prefixes included), attribute order,
//! and comments. Namespace handling stays at the prefix level — elements
//! are matched by local name, and new elements adopt the root's prefix.

use crate::error::DocumentError;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// One node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// An element.
    Element(XmlElement),
    /// Character content, unescaped.
    Text(String),
    /// A comment, verbatim.
    Comment(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Element name as written, prefix included.
    pub name: String,
    /// Attributes in document order: (name as written, unescaped value).
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an element with no attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_of(&self.name)
    }

    /// Returns an attribute value by local name.
    #[must_use]
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| local_of(name) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute by local name, replacing an existing one in place
    /// or appending a new unprefixed attribute.
    pub fn set_attr(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(name, _)| local_of(name) == local)
        {
            slot.1 = value;
        } else {
            self.attributes.push((local.to_string(), value));
        }
    }

    /// Removes an attribute by local name.
    pub fn remove_attr(&mut self, local: &str) {
        self.attributes.retain(|(name, _)| local_of(name) != local);
    }

    /// Returns the first child element with the given local name.
    #[must_use]
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// Returns the first child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Returns the first child element matching a local name and an
    /// attribute value.
    #[must_use]
    pub fn child_where(&self, local: &str, attr: &str, value: &str) -> Option<&XmlElement> {
        self.elements()
            .find(|e| e.local_name() == local && e.attr(attr) == Some(value))
    }

    /// Like [`Self::child_where`], mutably.
    pub fn child_where_mut(
        &mut self,
        local: &str,
        attr: &str,
        value: &str,
    ) -> Option<&mut XmlElement> {
        self.elements_mut()
            .find(|e| e.local_name() == local && e.attr(attr) == Some(value))
    }

    /// Iterates over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterates over child elements, mutably.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Appends a child element.
    pub fn push_element(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Replaces all character content with one text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|n| !matches!(n, XmlNode::Text(_)));
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Keeps only the child elements the predicate accepts; text and
    /// comments always stay. Returns the number of elements removed.
    pub fn retain_elements<F: FnMut(&XmlElement) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.elements().count();
        self.children.retain(|node| match node {
            XmlNode::Element(e) => keep(e),
            _ => true,
        });
        before - self.elements().count()
    }
}

/// Returns the local part of a possibly prefixed name.
fn local_of(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// A parsed Orchestra document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The root element.
    pub root: XmlElement,
}

impl Document {
    /// Parses a document from XML text.
    ///
    /// # Errors
    /// Returns [`DocumentError`] when the input is not well-formed.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from(e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        DocumentError::structure("unbalanced end tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Ok(Event::Text(ref t)) => {
                    let raw = std::str::from_utf8(t.as_ref())?;
                    let text = quick_xml::escape::unescape(raw)?.into_owned();
                    if !text.is_empty() {
                        attach(&mut stack, &mut root, XmlNode::Text(text))?;
                    }
                }
                Ok(Event::CData(ref t)) => {
                    let text = std::str::from_utf8(t.as_ref())?.to_string();
                    attach(&mut stack, &mut root, XmlNode::Text(text))?;
                }
                Ok(Event::Comment(ref t)) => {
                    let text = std::str::from_utf8(t.as_ref())?.to_string();
                    attach(&mut stack, &mut root, XmlNode::Comment(text))?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(DocumentError::Xml(e)),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(DocumentError::structure("unclosed element".to_string()));
        }
        let root =
            root.ok_or_else(|| DocumentError::structure("no root element".to_string()))?;
        Ok(Self { root })
    }

    /// Returns the root element's namespace prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.root.name.rsplit_once(':').map(|(prefix, _)| prefix)
    }

    /// Qualifies a local name with the root's prefix.
    #[must_use]
    pub fn qualified(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    /// Serializes the document with an XML declaration and two-space
    /// indentation.
    ///
    /// # Errors
    /// Returns [`DocumentError`] when serialization fails.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root)?;
        let bytes = writer.into_inner();
        Ok(String::from_utf8(bytes).map_err(|e| e.utf8_error())?)
    }
}

/// Builds an element (name and attributes) from a start tag.
fn element_from(e: &BytesStart<'_>) -> Result<XmlElement, DocumentError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut element = XmlElement::new(name);
    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Attaches a finished node to the open element on top of the stack, or as
/// the document root.
fn attach(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) => {
            if root.is_some() {
                return Err(DocumentError::structure(
                    "multiple root elements".to_string(),
                ));
            }
            *root = Some(element);
            Ok(())
        }
        // Stray text or comments outside the root are dropped.
        _ => Ok(()),
    }
}

/// Recursively writes one element.
fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(
                quick_xml::escape::escape(value.as_str()).into_owned().into_bytes(),
            ),
        });
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => {
                writer.write_event(Event::Text(BytesText::new(t)))?;
            }
            XmlNode::Comment(t) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fixr:repository xmlns:fixr="http://fixprotocol.io/2020/orchestra/repository" name="Demo">
  <fixr:fields>
    <fixr:field id="150" name="ExecType" type="ExecTypeCodeSet"/>
    <fixr:field id="39" name="OrdStatus" type="OrdStatusCodeSet"/>
  </fixr:fields>
  <!-- trailing note -->
</fixr:repository>"#;

    #[test]
    fn test_parse_tree_shape() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.root.local_name(), "repository");
        assert_eq!(doc.prefix(), Some("fixr"));
        assert_eq!(doc.root.attr("name"), Some("Demo"));

        let fields = doc.root.child("fields").unwrap();
        assert_eq!(fields.elements().count(), 2);
        let field = fields.child_where("field", "id", "150").unwrap();
        assert_eq!(field.attr("name"), Some("ExecType"));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let doc = Document::parse(SAMPLE).unwrap();
        let first = doc.to_xml().unwrap();
        let again = Document::parse(&first).unwrap();
        let second = again.to_xml().unwrap();
        assert_eq!(first, second);
        assert!(first.contains("<!-- trailing note -->"));
    }

    #[test]
    fn test_escaped_attribute_round_trip() {
        let xml = r#"<root note="a &amp; b &lt;c&gt;"><child/></root>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.root.attr("note"), Some("a & b <c>"));

        let out = doc.to_xml().unwrap();
        assert!(out.contains("a &amp; b &lt;c&gt;"));
        let reparsed = Document::parse(&out).unwrap();
        assert_eq!(reparsed.root.attr("note"), Some("a & b <c>"));
    }

    #[test]
    fn test_set_attr_preserves_position() {
        let xml = r#"<root><e a="1" b="2" c="3"/></root>"#;
        let mut doc = Document::parse(xml).unwrap();
        let e = doc.root.child_mut("e").unwrap();
        e.set_attr("b", "9");
        assert_eq!(e.attributes[1], ("b".to_string(), "9".to_string()));
    }

    #[test]
    fn test_retain_elements() {
        let xml = r#"<root><k id="1"/><k id="2"/><k id="3"/></root>"#;
        let mut doc = Document::parse(xml).unwrap();
        let removed = doc.root.retain_elements(|e| e.attr("id") != Some("2"));
        assert_eq!(removed, 1);
        assert_eq!(doc.root.elements().count(), 2);
    }

    #[test]
    fn test_qualified_without_prefix() {
        let doc = Document::parse("<repository/>").unwrap();
        assert_eq!(doc.qualified("field"), "field");
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(Document::parse("").is_err());
    }
}
