//! Owned XML element tree
//!
//! BPMN files and the parts of OOXML packages are small enough to load whole,
//! and both the extractor and the transformer need random access (children,
//! descendants, attribute lookup) rather than a streaming view. This module
//! reads a document with quick-xml's namespace-aware reader into an owned tree.
//!
//! Every element keeps its resolved namespace URI, so callers match on
//! `(namespace, local name)` and never on the prefix a file happened to use.

use crate::error::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// Deepest element nesting accepted. The tree walks and the drop of
/// `XmlElement` recurse, so unbounded depth would exhaust the stack.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    /// Resolved namespace URI; `None` for unprefixed attributes
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Resolved namespace URI, `None` for unqualified names
    pub namespace: Option<String>,
    /// Local name with the prefix stripped
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Direct character data, concatenated
    pub text: String,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Unprefixed attribute. Prefixed ones with the same local name are ignored.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == key)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == key && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// All matching elements below this one, depth-first in document order
    pub fn descendants_named<'a>(&'a self, namespace: &str, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_descendants(self, namespace, name, &mut found);
        found
    }

    /// Character data of this element and everything below it.
    /// Mixed content is flattened parent-first.
    pub fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }
}

fn collect_descendants<'a>(
    element: &'a XmlElement,
    namespace: &str,
    name: &str,
    found: &mut Vec<&'a XmlElement>,
) {
    for child in &element.children {
        if child.is(namespace, name) {
            found.push(child);
        }
        collect_descendants(child, namespace, name, found);
    }
}

/// Parse raw bytes (UTF-8, optional BOM) into an element tree
pub fn parse_document(bytes: &[u8]) -> Result<XmlElement, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)?;
    parse_str(text)
}

pub fn parse_str(text: &str) -> Result<XmlElement, ParseError> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let (namespace, event) = match reader.read_resolved_event() {
            Ok((resolved, event)) => (resolve_namespace(resolved, position)?, event),
            Err(source) => return Err(ParseError::Xml { position, source }),
        };

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(ParseError::structure(position, "junk after document element"));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::structure(
                        position,
                        format!("elements nested deeper than {MAX_DEPTH} levels"),
                    ));
                }
                stack.push(open_element(&reader, namespace, &start, position)?);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, namespace, &start, position)?;
                attach(element, &mut stack, &mut root, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::structure(position, "closing tag without opening tag"))?;
                attach(element, &mut stack, &mut root, position)?;
            }
            Event::Text(content) => {
                let value = content
                    .unescape()
                    .map_err(|source| ParseError::Xml { position, source })?;
                match stack.last_mut() {
                    Some(parent) => parent.text.push_str(&value),
                    None if value.trim().is_empty() => {}
                    None => {
                        return Err(ParseError::structure(position, "text outside the root element"))
                    }
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    let position = reader.buffer_position();
    if let Some(open) = stack.last() {
        return Err(ParseError::structure(
            position,
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.ok_or_else(|| ParseError::structure(position, "no element found"))
}

fn resolve_namespace(
    resolved: ResolveResult<'_>,
    position: usize,
) -> Result<Option<String>, ParseError> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::structure(
            position,
            format!("unbound prefix '{}'", String::from_utf8_lossy(&prefix)),
        )),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    position: usize,
) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| ParseError::Xml {
            position,
            source: err.into(),
        })?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local_name) = reader.resolve_attribute(attribute.key);
        let attr_namespace = match resolved {
            // The xml prefix is bound by definition
            ResolveResult::Unknown(prefix) if prefix == b"xml" => Some(XML_NS.to_string()),
            other => resolve_namespace(other, position)?,
        };
        let name = String::from_utf8_lossy(local_name.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|source| ParseError::Xml { position, source })?
            .into_owned();
        attributes.push(XmlAttribute {
            namespace: attr_namespace,
            name,
            value,
        });
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    position: usize,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(ParseError::structure(position, "junk after document element"))
        }
        None => *root = Some(element),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[test]
    fn test_resolves_namespaces_regardless_of_prefix() {
        let xml = r#"<a:root xmlns:a="urn:test"><a:item id="1"/><item xmlns="urn:test" id="2"/></a:root>"#;
        let root = parse_str(xml).unwrap();
        assert!(root.is(NS, "root"));
        let ids: Vec<_> = root.children_named(NS, "item").filter_map(|c| c.attr("id")).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_attributes_keep_their_namespace() {
        let xml = r#"<root xmlns:r="urn:rel" r:id="rId1" name="x &amp; y" xml:space="preserve"/>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.attr("id"), None);
        assert_eq!(root.attr_ns("urn:rel", "id"), Some("rId1"));
        assert_eq!(root.attr("name"), Some("x & y"));
        assert_eq!(root.attr_ns(XML_NS, "space"), Some("preserve"));
        assert_eq!(root.attributes.len(), 3);
    }

    #[test]
    fn test_prefixed_attribute_does_not_shadow_plain_one() {
        let xml = r#"<task xmlns:ext="urn:vendor" ext:name="vendor" name="Revisar" ext:id="X" id="T1"/>"#;
        let task = parse_str(xml).unwrap();
        assert_eq!(task.attr("name"), Some("Revisar"));
        assert_eq!(task.attr("id"), Some("T1"));
        assert_eq!(task.attr_ns("urn:vendor", "name"), Some("vendor"));
    }

    #[test]
    fn test_nesting_depth_is_capped() {
        let at_limit = format!("{}{}", "<x>".repeat(MAX_DEPTH), "</x>".repeat(MAX_DEPTH));
        assert!(parse_str(&at_limit).is_ok());

        let depth = 100_000;
        let deep = format!("{}{}", "<x>".repeat(depth), "</x>".repeat(depth));
        assert!(matches!(parse_str(&deep), Err(ParseError::Structure { .. })));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let xml = r#"<r xmlns="urn:test"><s id="a"><s id="b"/></s><x><s id="c"/></x></r>"#;
        let root = parse_str(xml).unwrap();
        let ids: Vec<_> = root
            .descendants_named(NS, "s")
            .into_iter()
            .filter_map(|e| e.attr("id"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_text_and_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("<t>hola <![CDATA[mundo]]></t>".as_bytes());
        let root = parse_document(&bytes).unwrap();
        assert_eq!(root.text, "hola mundo");
    }

    #[test]
    fn test_unclosed_tag_is_error() {
        assert!(parse_str("<root><child></root>").is_err());
        assert!(parse_str("<root><child>").is_err());
    }

    #[test]
    fn test_structural_errors() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<a/><b/>").is_err());
        assert!(parse_str("<a/>junk").is_err());
        assert!(parse_str("<x:a/>").is_err());
        assert!(parse_document(&[0x3c, 0xff, 0x3e]).is_err());
    }
}
