//! Minimal XML element tree for the repository documents.
//!
//! The index and ledger files are small, hand-inspectable documents that are
//! read whole, mutated in memory and written back whole. An owned tree of
//! [`Element`]s is all that requires. Reading and writing go through
//! `quick-xml` events.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Declaration written at the top of every document.
///
/// Single quotes and the lowercase encoding match what existing repositories
/// already contain, so regenerated files diff cleanly against them.
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

/// Errors raised while reading or writing an XML document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// An attribute could not be decoded.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Writing the serialized document failed.
    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    /// Tags are well-formed but the element structure is not.
    #[error("Malformed document: {0}")]
    Malformed(&'static str),

    /// The input contained no element at all.
    #[error("Document has no root element")]
    MissingRoot,
}

/// An owned XML element: name, attributes, direct text and child elements.
///
/// Text is the concatenation of every text node directly inside the element,
/// trimmed of surrounding whitespace. For `<pge>demo<in_cache>True</in_cache></pge>`
/// the `pge` element has text `demo` and one child.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Direct text content.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an element holding only text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set an attribute, replacing any previous value for the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable access to the first child with the given tag name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// All children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the given tag name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Text of the first child matching any of `names`, tried in order.
    ///
    /// Used where one field has been spelled more than one way across
    /// document generations (`creationDate` vs `creation_date`).
    pub fn child_text_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.child_text(n))
    }

    /// Texts of the `item` children inside the first `list` child.
    ///
    /// A missing list element yields an empty vector.
    pub fn list_texts(&self, list: &str, item: &str) -> Vec<String> {
        self.child(list)
            .map(|l| l.children_named(item).map(|i| i.text.clone()).collect())
            .unwrap_or_default()
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append a text-only child element.
    pub fn push_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.children.push(Self::with_text(name, text));
    }

    /// Append a `<list><item>..</item>*</list>` child. An empty list still
    /// produces the (empty) container element.
    pub fn push_list<S: AsRef<str>>(&mut self, list: &str, item: &str, values: &[S]) {
        let mut container = Self::new(list);
        for v in values {
            container.push_text(item, v.as_ref());
        }
        self.children.push(container);
    }

    /// Parse a document and return its root element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the input is not well-formed, has mismatched or
    /// unclosed tags, more than one root, or no root at all.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(XmlError::Malformed("unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element"));
        }
        root.ok_or(XmlError::MissingRoot)
    }

    /// Serialize this element as a complete document, declaration included.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if writing to the in-memory buffer fails.
    pub fn to_document(&self) -> Result<Vec<u8>, XmlError> {
        let mut buf = XML_DECLARATION.as_bytes().to_vec();
        let mut writer = Writer::new(&mut buf);
        write_element(&mut writer, self)?;
        Ok(buf)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(XmlError::Malformed("multiple root elements"));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (k, v) in &element.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }

    if element.text.is_empty() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(
            element.text.as_str(),
        ))))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_content_like_the_ledger() {
        let doc = "<?xml version='1.0' encoding='utf-8'?>\n\
                   <pges><pge>demo<in_cache>True</in_cache><installed>False</installed></pge></pges>";
        let root = Element::parse(doc).unwrap();

        assert_eq!(root.name, "pges");
        let pge = root.child("pge").unwrap();
        assert_eq!(pge.text, "demo");
        assert_eq!(pge.child_text("in_cache"), Some("True"));
        assert_eq!(pge.child_text("installed"), Some("False"));
    }

    #[test]
    fn reads_attributes_and_lists() {
        let doc = r#"<packages><package id="demo-1.0.0"><dependencies><dependency>a</dependency><dependency>b</dependency></dependencies></package></packages>"#;
        let root = Element::parse(doc).unwrap();
        let pkg = root.child("package").unwrap();

        assert_eq!(pkg.attribute("id"), Some("demo-1.0.0"));
        assert_eq!(pkg.list_texts("dependencies", "dependency"), vec!["a", "b"]);
        assert!(pkg.list_texts("supported_os", "os").is_empty());
    }

    #[test]
    fn document_starts_with_declaration_and_survives_reparse() {
        let mut root = Element::new("packages");
        let mut pkg = Element::new("package").with_attribute("id", "x-1");
        pkg.push_text("name", "a < b & c");
        pkg.push_list("dependencies", "dependency", &["z"]);
        pkg.push_list::<&str>("supported_os", "os", &[]);
        root.push(pkg);

        let bytes = root.to_document().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(XML_DECLARATION));
        assert!(text.contains("a &lt; b &amp; c"));

        let reparsed = Element::parse(&text).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn empty_root_is_written_as_empty_element() {
        let bytes = Element::new("packages").to_document().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, format!("{XML_DECLARATION}<packages/>"));
    }

    #[test]
    fn rejects_garbage_and_truncation() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("not xml at all").is_err());
        assert!(Element::parse("<packages><package>").is_err());
        assert!(Element::parse("<a></b>").is_err());
        assert!(Element::parse("<a/><b/>").is_err());
    }
}
