//! Rewriting of Moodle HTML into edX HTML components.
//!
//! Moodle stores cross-references as placeholders that only make sense
//! inside a backup:
//! - `src="@@PLUGINFILE@@/<path>"` for uploaded files
//! - `href="$@PAGEVIEWBYID*<id>@$"` for links to another page activity
//!
//! These become `/static/<name>` and `/jump_to_id/<url_name>` links.
//!
//! HTML named character references such as `&nbsp;` are not defined in XML,
//! so they are rewritten as numeric references.

use std::sync::LazyLock;

use html5ever::data::NAMED_ENTITIES;
use regex_lite::{Captures, Regex};

use super::xml::escape_xml;
use crate::error::Result;

/// Empty paragraph marker Word leaves behind in pasted content.
pub const VENDOR_EMPTY_TAG: &str = "<o:p></o:p>";

/// Matches ` src="@@PLUGINFILE@@/..."`
static PLUGINFILE_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" src="@@PLUGINFILE@@/([^"]+)""#).unwrap());

/// Matches ` href="$@PAGEVIEWBYID*<id>@$"`
static PAGE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" href="\$@PAGEVIEWBYID\*([^"]+)@\$""#).unwrap());

/// Matches `&name;`
static NAMED_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*;)").unwrap());

/// Matches `$$...$$` spans, shortest first.
static MATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\$([^$]*?)\$\$").unwrap());

/// Matches HTML void elements written without a closing slash.
static VOID_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|input|col|area|wbr)(\s[^<>]*?)?\s*/?>").unwrap()
});

/// Source of `url_name`s for page activities referenced by module id.
///
/// Resolving the same id twice must return the same name.
pub trait PageLinkResolver {
    fn resolve_page(&mut self, module_id: &str) -> Result<String>;
}

/// A rendered HTML component ready to be stored as `html/<url_name>.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    pub url_name: String,
    pub content: String,
}

/// Turn `$$...$$` into `[mathjax]...[/mathjax]`.
pub fn fix_math(text: &str) -> String {
    MATH_RE
        .replace_all(text, "[mathjax]${1}[/mathjax]")
        .into_owned()
}

pub fn strip_vendor_tags(html: &str) -> String {
    html.replace(VENDOR_EMPTY_TAG, "")
}

/// Rewrite HTML named character references as numeric ones.
///
/// The five references XML predefines are kept. A name HTML doesn't know
/// either has its ampersand escaped so it survives as literal text.
pub fn numeric_char_refs(html: &str) -> String {
    NAMED_REF_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let name = &caps[1];
            if matches!(name, "amp;" | "lt;" | "gt;" | "quot;" | "apos;") {
                return caps[0].to_string();
            }
            match NAMED_ENTITIES.get(name) {
                Some(&(first, 0)) => format!("&#{first};"),
                Some(&(first, second)) => format!("&#{first};&#{second};"),
                None => format!("&amp;{name}"),
            }
        })
        .into_owned()
}

/// Point uploaded-file references at the course's static directory.
///
/// Files are copied with `%20` replaced by `_`, so references follow suit.
pub fn rewrite_static_src(html: &str) -> String {
    PLUGINFILE_SRC_RE
        .replace_all(html, |caps: &Captures<'_>| {
            format!(r#" src="/static/{}""#, caps[1].replace("%20", "_"))
        })
        .into_owned()
}

/// Replace page-link placeholders with `/jump_to_id/` links.
pub fn rewrite_page_links(html: &str, pages: &mut dyn PageLinkResolver) -> Result<String> {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for caps in PAGE_LINK_RE.captures_iter(html) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let url_name = pages.resolve_page(id.as_str().trim())?;
        out.push_str(&html[last..whole.start()]);
        out.push_str(&format!(r#" href="/jump_to_id/{url_name}""#));
        last = whole.end();
    }

    out.push_str(&html[last..]);
    Ok(out)
}

/// Write `<br>` style void elements as `<br/>` so the markup parses as XML.
pub fn close_void_elements(html: &str) -> String {
    VOID_ELEMENT_RE.replace_all(html, "<${1}${2}/>").into_owned()
}

/// Render a Moodle HTML fragment as an edX HTML component.
pub fn render_html(
    url_name: &str,
    display_name: &str,
    raw_html: &str,
    pages: &mut dyn PageLinkResolver,
) -> Result<HtmlDocument> {
    let body = numeric_char_refs(&strip_vendor_tags(raw_html));
    let body = rewrite_static_src(&body);
    let body = rewrite_page_links(&body, pages)?;

    Ok(HtmlDocument {
        url_name: url_name.to_string(),
        content: format!(
            "<html display_name=\"{}\">\n{}\n</html>",
            escape_xml(display_name),
            body
        ),
    })
}
