//! Display names for chapters built from Moodle sections.
//!
//! Authors often leave the section name unset and put a heading in the
//! summary instead, so the name comes from the first strategy that yields
//! something non-empty.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::edx::html_to_text;
use crate::moodle::SourceSection;
use crate::util::truncate_chars;

/// Longest summary prefix used as a chapter name.
const SUMMARY_NAME_CHARS: usize = 50;

/// Matches the first `<h2>` element of a summary.
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h2(?:\s[^>]*)?>(.*?)</h2>").unwrap());

/// What a naming strategy gets to look at.
struct NameSource<'a> {
    section: &'a SourceSection,
    /// Summary with vendor tags already removed.
    summary: &'a str,
    activity_title: &'a str,
}

type Strategy = fn(&NameSource<'_>) -> Option<String>;

const STRATEGIES: [Strategy; 4] = [section_name, first_h2_heading, summary_first_line, activity_title];

/// Chapter name for a section, falling back from the section's own name to
/// the first `<h2>` of its summary, the start of the summary text, and
/// finally the title of the activity that opened the chapter.
pub fn chapter_name(section: &SourceSection, summary: &str, activity_title: &str) -> String {
    let source = NameSource {
        section,
        summary,
        activity_title,
    };
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&source).filter(|name| !name.is_empty()))
        .unwrap_or_default()
}

fn section_name(source: &NameSource<'_>) -> Option<String> {
    source.section.name.as_deref().map(|n| n.trim().to_string())
}

fn first_h2_heading(source: &NameSource<'_>) -> Option<String> {
    let caps = H2_RE.captures(source.summary)?;
    let text = html_to_text(&caps[1]).replace(['\n', '\r'], "");
    Some(text.trim().to_string())
}

fn summary_first_line(source: &NameSource<'_>) -> Option<String> {
    let text = html_to_text(source.summary);
    let line = truncate_chars(&text, SUMMARY_NAME_CHARS).lines().next()?;
    Some(line.trim().to_string())
}

fn activity_title(source: &NameSource<'_>) -> Option<String> {
    let line = source.activity_title.trim().lines().next()?;
    Some(line.trim().to_string())
}
