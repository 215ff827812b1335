//! Byte and text helpers shared by the backup readers.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in old Moodle exports)
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Pull the `encoding="..."` label out of an XML declaration, if any.
pub fn xml_encoding_hint(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(100)];
    let head = std::str::from_utf8(head).ok()?;
    let decl_end = head.find("?>")?;
    let decl = &head[..decl_end];
    let start = decl.find("encoding=")? + "encoding=".len();
    let quote = decl[start..].chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &decl[start + 1..];
    rest.find(quote).map(|end| &rest[..end])
}

/// Return the first `max_chars` characters of `s` (never splits a character).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes(), None), "héllo");
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(decode_text(&bytes, None), "hi");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is 'é' in Windows-1252 and invalid as a lone UTF-8 byte
        let bytes = [b'c', b'a', b'f', 0xE9];
        assert_eq!(decode_text(&bytes, None), "café");
    }

    #[test]
    fn test_decode_with_hint() {
        let bytes = [b'a', 0xE9];
        assert_eq!(decode_text(&bytes, Some("iso-8859-1")), "aé");
    }

    #[test]
    fn test_xml_encoding_hint() {
        assert_eq!(
            xml_encoding_hint(br#"<?xml version="1.0" encoding="UTF-8"?><a/>"#),
            Some("UTF-8")
        );
        assert_eq!(
            xml_encoding_hint(b"<?xml version='1.0' encoding='latin1'?><a/>"),
            Some("latin1")
        );
        assert_eq!(xml_encoding_hint(b"<a/>"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hé", 5), "hé");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("", 2), "");
    }
}
