//! Lossless XML tree for WordprocessingML parts.
//!
//! Elements keep their qualified names and raw (still escaped) attribute values
//! so that everything the engine does not interpret is written back exactly as
//! it was read. Character data is held unescaped and escaped again on output.
use crate::common::xml::{escape_xml, unescape_xml};
use memchr::memmem;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

/// An attribute with its value in escaped (serialized) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<XmlNode>,
}

/// A node in an element's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    /// Comments, processing instructions and CDATA sections, verbatim
    Raw(String),
}

impl XmlElement {
    /// Create an empty element.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The name without its namespace prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether the local name is `local`.
    #[inline]
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// The namespace prefix including the colon (`w:`), or an empty string.
    pub fn prefix(&self) -> &str {
        match self.name.find(':') {
            Some(pos) => &self.name[..=pos],
            None => "",
        }
    }

    /// Raw value of the attribute with qualified name `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute; `value` must already be escaped.
    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.key == key) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attribute { key, value }),
        }
    }

    /// Remove an attribute by qualified name.
    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|a| a.key != key);
    }

    /// Child elements, skipping text and raw nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Visit this element and every descendant element, parents first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut XmlElement)) {
        f(self);
        for child in &mut self.children {
            if let XmlNode::Element(el) = child {
                el.walk_mut(f);
            }
        }
    }

    /// Concatenated character data of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Serialize this element.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Append the serialized element to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attrs {
            // Raw values never contain both quote characters unescaped
            let quote = if attr.value.contains('"') { '\'' } else { '"' };
            out.push(' ');
            out.push_str(&attr.key);
            out.push('=');
            out.push(quote);
            out.push_str(&attr.value);
            out.push(quote);
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl XmlNode {
    /// Append the serialized node to `out`.
    pub fn write_to(&self, out: &mut String) {
        match self {
            XmlNode::Element(el) => el.write_to(out),
            XmlNode::Text(text) => out.push_str(&escape_xml(text)),
            XmlNode::Raw(raw) => out.push_str(raw),
        }
    }

    /// The element, if this node is one.
    #[inline]
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Whether this is character data consisting only of whitespace.
    #[inline]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, XmlNode::Text(t) if t.chars().all(char::is_whitespace))
    }
}

fn collect_text(nodes: &[XmlNode], out: &mut String) {
    for node in nodes {
        match node {
            XmlNode::Element(el) => collect_text(&el.children, out),
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Raw(_) => {},
        }
    }
}

/// The name without its namespace prefix.
#[inline]
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// The `<?xml ...?>` declaration and the whitespace that follows it
    pub declaration: Option<String>,
    /// Comments and processing instructions before the root
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    /// Comments and processing instructions after the root
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a complete XML part.
    ///
    /// # Errors
    /// Returns a description of the problem when the input is not well-formed
    /// UTF-8 XML with exactly one root element.
    pub fn parse(xml: &[u8]) -> Result<Self, String> {
        let xml = xml.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(xml);
        let text = std::str::from_utf8(xml).map_err(|e| format!("part is not UTF-8: {}", e))?;
        let (declaration, body) = split_declaration(text);

        let mut reader = Reader::from_str(body);
        let mut tree = TreeBuilder::default();

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| {
                format!("{} (at byte {})", e, reader.error_position())
            })?;
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(e) => tree.open(element_from(&e)?),
                Event::Empty(e) => tree.attach(XmlNode::Element(element_from(&e)?))?,
                Event::End(_) => tree.close()?,
                Event::Text(e) => {
                    let raw = utf8(&e)?;
                    tree.text(unescape_xml(raw))?;
                },
                Event::GeneralRef(e) => {
                    let entity = format!("&{};", utf8(&e)?);
                    let decoded = unescape_xml(&entity);
                    if decoded == entity {
                        return Err(format!("unknown entity {}", entity));
                    }
                    tree.text(decoded)?;
                },
                Event::CData(_) | Event::Comment(_) | Event::PI(_) => {
                    tree.attach(XmlNode::Raw(body[start..end].to_string()))?;
                },
                Event::Decl(_) => return Err("misplaced XML declaration".to_string()),
                Event::DocType(_) => return Err("DOCTYPE is not allowed in a part".to_string()),
                Event::Eof => break,
            }
        }

        tree.finish(declaration)
    }

    /// Serialize the document.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        if let Some(decl) = &self.declaration {
            out.push_str(decl);
        }
        for node in &self.prolog {
            node.write_to(&mut out);
        }
        self.root.write_to(&mut out);
        for node in &self.epilog {
            node.write_to(&mut out);
        }
        out
    }
}

/// Split off the XML declaration together with the whitespace after it.
fn split_declaration(text: &str) -> (Option<String>, &str) {
    let is_decl = text.starts_with("<?xml")
        && text[5..].starts_with(|c: char| c.is_ascii_whitespace() || c == '?');
    if !is_decl {
        return (None, text);
    }
    match memmem::find(text.as_bytes(), b"?>") {
        Some(pos) => {
            let after = &text[pos + 2..];
            let ws = after.len() - after.trim_start().len();
            let split = pos + 2 + ws;
            (Some(text[..split].to_string()), &text[split..])
        },
        None => (None, text),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| e.to_string())
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        element.attrs.push(Attribute {
            key: utf8(attr.key.as_ref())?.to_string(),
            value: utf8(&attr.value)?.to_string(),
        });
    }
    Ok(element)
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<XmlElement>,
    prolog: Vec<XmlNode>,
    root: Option<XmlElement>,
    epilog: Vec<XmlNode>,
}

impl TreeBuilder {
    fn open(&mut self, element: XmlElement) {
        self.stack.push(element);
    }

    fn close(&mut self) -> Result<(), String> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| "closing tag without an open element".to_string())?;
        self.attach(XmlNode::Element(element))
    }

    fn attach(&mut self, node: XmlNode) -> Result<(), String> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            XmlNode::Element(el) if self.root.is_none() => {
                self.root = Some(el);
                Ok(())
            },
            XmlNode::Element(el) => Err(format!("second root element <{}>", el.name)),
            XmlNode::Text(t) if t.trim().is_empty() => Ok(()),
            XmlNode::Text(_) => Err("text outside the root element".to_string()),
            raw if self.root.is_none() => {
                self.prolog.push(raw);
                Ok(())
            },
            raw => {
                self.epilog.push(raw);
                Ok(())
            },
        }
    }

    fn text(&mut self, text: Cow<'_, str>) -> Result<(), String> {
        if let Some(XmlNode::Text(last)) = self.stack.last_mut().and_then(|p| p.children.last_mut())
        {
            last.push_str(&text);
            return Ok(());
        }
        self.attach(XmlNode::Text(text.into_owned()))
    }

    fn finish(self, declaration: Option<String>) -> Result<XmlDocument, String> {
        if let Some(open) = self.stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        let root = self.root.ok_or_else(|| "no root element".to_string())?;
        Ok(XmlDocument {
            declaration,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PART: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
        <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
        <w:body><w:p><w:r><w:t xml:space=\"preserve\">A &amp; B </w:t></w:r></w:p>\
        <!-- note --><w:sectPr w:rsidR=\"00AB\"/></w:body></w:document>";

    #[test]
    fn test_parse_and_write_identity() {
        let doc = XmlDocument::parse(PART.as_bytes()).unwrap();
        assert_eq!(
            doc.declaration.as_deref(),
            Some("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n")
        );
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.root.text(), "A & B ");
        assert_eq!(doc.to_xml(), PART);
    }

    #[test]
    fn test_character_references_are_decoded() {
        let doc = XmlDocument::parse(b"<a>&#72;i&#x21; &lt;b&gt;</a>").unwrap();
        assert_eq!(doc.root.children, vec![XmlNode::Text("Hi! <b>".to_string())]);
        assert_eq!(doc.to_xml(), "<a>Hi! &lt;b&gt;</a>");
    }

    #[test]
    fn test_single_quoted_attribute_survives() {
        let doc = XmlDocument::parse(b"<a t='say \"hi\"'/>").unwrap();
        assert_eq!(doc.root.attr("t"), Some("say \"hi\""));
        assert_eq!(doc.to_xml(), "<a t='say \"hi\"'/>");
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"<a>").is_err());
        assert!(XmlDocument::parse(b"<a/><b/>").is_err());
        assert!(XmlDocument::parse(b"").is_err());
        assert!(XmlDocument::parse(b"<a>&nbsp;</a>").is_err());
    }

    #[test]
    fn test_local_name_and_prefix() {
        let el = XmlElement::new("w:tbl");
        assert!(el.is("tbl"));
        assert_eq!(el.prefix(), "w:");
        assert_eq!(XmlElement::new("body").prefix(), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_text_round_trip(s in "[^\u{0}-\u{8}\u{b}\u{c}\u{e}-\u{1f}\u{fffe}\u{ffff}]*") {
            let mut root = XmlElement::new("w:t");
            if !s.is_empty() {
                root.children.push(XmlNode::Text(s.clone()));
            }
            let written = root.to_xml();
            let parsed = XmlDocument::parse(written.as_bytes()).unwrap();
            prop_assert_eq!(parsed.root, root);
        }
    }
}
