//! XML output helpers: escaping and indentation.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// Escape text for use inside a double-quoted attribute or element content.
pub fn escape_xml(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Re-indent a serialized document, failing if it is not well-formed.
///
/// Whitespace-only text between elements is dropped and replaced by the
/// writer's own indentation; any other text is kept verbatim.
pub fn pretty_print(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Text(e)) if e.iter().all(u8::is_ascii_whitespace) => {}
            Ok(event) => {
                match &event {
                    Event::Start(_) => {
                        if depth == 0 && seen_root {
                            return Err(Error::MalformedXml(
                                "more than one root element".to_string(),
                            ));
                        }
                        depth += 1;
                        seen_root = true;
                    }
                    Event::End(_) => depth = depth.saturating_sub(1),
                    Event::Empty(_) => {
                        if depth == 0 && seen_root {
                            return Err(Error::MalformedXml(
                                "more than one root element".to_string(),
                            ));
                        }
                        seen_root = true;
                    }
                    Event::GeneralRef(r) if !is_xml_ref(r) => {
                        return Err(Error::MalformedXml(format!(
                            "undefined entity &{};",
                            String::from_utf8_lossy(r)
                        )));
                    }
                    _ => {}
                }
                writer.write_event(event)?;
            }
            Err(e) => return Err(Error::Xml(e)),
        }
    }

    if depth != 0 {
        return Err(Error::MalformedXml("unclosed element at end of document".to_string()));
    }
    if !seen_root {
        return Err(Error::MalformedXml("document has no root element".to_string()));
    }

    let mut out = String::from_utf8(writer.into_inner())?;
    out.push('\n');
    Ok(out)
}

/// Predefined entity or character reference, given the text between `&`
/// and `;`.
fn is_xml_ref(name: &[u8]) -> bool {
    matches!(name, b"amp" | b"lt" | b"gt" | b"quot" | b"apos") || name.starts_with(b"#")
}

/// Check that `xml` is a single well-formed element.
pub fn check_well_formed(xml: &str) -> Result<()> {
    pretty_print(xml).map(|_| ())
}
