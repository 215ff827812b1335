//! Plain-text rendering of HTML fragments.
//!
//! Used to derive chapter names from section summaries. Only the text
//! survives: block-level elements become line breaks, runs of whitespace
//! collapse to a single space, and character references are decoded by the
//! html5ever tokenizer.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Render an HTML fragment as plain text.
pub fn html_to_text(html: &str) -> String {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let tokenizer = Tokenizer::new(TextSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let raw = tokenizer.sink.state.take().out;
    tidy_lines(&raw)
}

/// Token sink collecting character data.
///
/// Uses interior mutability (RefCell) because html5ever's TokenSink trait
/// requires methods to take `&self`.
#[derive(Default)]
struct TextSink {
    state: RefCell<TextState>,
}

#[derive(Default)]
struct TextState {
    out: String,
    /// Depth inside `<script>`/`<style>`, whose content is not text.
    skip: usize,
}

impl TextState {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    fn line_break(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }
}

impl TokenSink for TextSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();
        match token {
            Token::CharacterTokens(text) => {
                if state.skip == 0 {
                    state.push_text(&text);
                }
            }
            Token::TagToken(tag) => {
                let name: &str = &tag.name;
                match (tag.kind, name) {
                    (TagKind::StartTag, "script" | "style") if !tag.self_closing => {
                        state.skip += 1;
                    }
                    (TagKind::EndTag, "script" | "style") => {
                        state.skip = state.skip.saturating_sub(1);
                    }
                    (_, "br") => state.line_break(),
                    (_, name) if is_block(name) => state.line_break(),
                    _ => {}
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "table"
            | "blockquote"
            | "pre"
            | "section"
            | "article"
            | "hr"
    )
}

/// Trim each line and drop blank ones.
fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(html_to_text("Hello world"), "Hello world");
    }

    #[test]
    fn test_blocks_become_lines() {
        assert_eq!(
            html_to_text("<p>First   para</p><p>Second <b>bold</b></p>"),
            "First para\nSecond bold"
        );
    }

    #[test]
    fn test_br_breaks_line() {
        assert_eq!(html_to_text("one<br/>two"), "one\ntwo");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(html_to_text("<p>A &amp; B&nbsp;C</p>"), "A & B C");
    }

    #[test]
    fn test_script_and_style_skipped() {
        assert_eq!(
            html_to_text("<style>p { color: red }</style><p>Shown</p><script>var x;</script>"),
            "Shown"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<p>  </p>"), "");
    }
}
