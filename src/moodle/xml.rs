//! Owned element tree for backup XML files.
//!
//! Backup documents are small and read many times with path-like lookups,
//! so each file is parsed once into an `XmlElement` tree.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// An XML element with its attributes, child elements and character data.
///
/// Text is the concatenation of every text, CDATA and entity chunk directly
/// inside the element, with entities already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(content: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(content);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if let Some(top) = stack.last_mut() {
                        let entity = String::from_utf8_lossy(e.as_ref());
                        match resolve_entity(&entity) {
                            Some(resolved) => top.text.push_str(&resolved),
                            None => {
                                top.text.push('&');
                                top.text.push_str(&entity);
                                top.text.push(';');
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::MalformedXml(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        root.ok_or_else(|| Error::MalformedXml("document has no root element".to_string()))
    }

    /// Value of the attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Character data of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant named `name`, in document order.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        self.collect(name, &mut out);
        out
    }

    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect(name, out);
        }
    }

    /// Text of the first descendant named `name`.
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.find(name).map(XmlElement::text)
    }

    /// Text of the first descendant named `name`, or a `MissingElement` error.
    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text_of(name)
            .ok_or_else(|| Error::MissingElement(format!("<{name}> in <{}>", self.name)))
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = e.name();
    let mut element = XmlElement {
        name: String::from_utf8_lossy(local_name(name.as_ref())).into_owned(),
        ..Default::default()
    };

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| Error::MalformedXml(format!("attribute {key}: {err}")))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Extract local name from namespaced XML name (e.g., "xs:element" -> "element").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let root = XmlElement::parse(
            r#"<?xml version="1.0"?>
<moodle_backup>
  <information>
    <original_course_fullname>Physics 101</original_course_fullname>
    <contents>
      <activities>
        <activity><moduleid>1</moduleid></activity>
        <activity><moduleid>2</moduleid></activity>
      </activities>
    </contents>
  </information>
</moodle_backup>"#,
        )
        .unwrap();

        assert_eq!(root.name, "moodle_backup");
        assert_eq!(root.text_of("original_course_fullname"), Some("Physics 101"));
        let ids: Vec<&str> = root
            .find_all("activity")
            .iter()
            .filter_map(|a| a.text_of("moduleid"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_entities_are_resolved_without_trimming() {
        let root = XmlElement::parse("<intro>&lt;p&gt;A &amp; B&lt;/p&gt;</intro>").unwrap();
        assert_eq!(root.text(), "<p>A & B</p>");
    }

    #[test]
    fn test_numeric_entities() {
        let root = XmlElement::parse("<t>&#65;&#x42;</t>").unwrap();
        assert_eq!(root.text(), "AB");
    }

    #[test]
    fn test_cdata_kept_as_text() {
        let root = XmlElement::parse("<c><![CDATA[<b>bold</b>]]></c>").unwrap();
        assert_eq!(root.text(), "<b>bold</b>");
    }

    #[test]
    fn test_attributes_and_empty_elements() {
        let root =
            XmlElement::parse(r#"<files><file id="7" name="a &amp; b"/><file id="8"/></files>"#)
                .unwrap();
        let files = root.find_all("file");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].attr("id"), Some("7"));
        assert_eq!(files[0].attr("name"), Some("a & b"));
        assert_eq!(files[1].attr("name"), None);
    }

    #[test]
    fn test_child_is_direct_only() {
        let root = XmlElement::parse("<a><b><c>deep</c></b></a>").unwrap();
        assert!(root.child("c").is_none());
        assert_eq!(root.text_of("c"), Some("deep"));
    }

    #[test]
    fn test_require_text_missing() {
        let root = XmlElement::parse("<a/>").unwrap();
        assert!(matches!(
            root.require_text("name"),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_unclosed_document_is_error() {
        assert!(XmlElement::parse("<a><b></b>").is_err());
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(XmlElement::parse("").is_err());
    }
}
