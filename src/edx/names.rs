//! Generation of `url_name` identifiers.
//!
//! A `url_name` is used both as a file stem under `html/`, `problem/` and
//! `course/` and as the cross-reference key in `/jump_to_id/` links, so it
//! must be restricted to a filesystem- and URL-safe alphabet and be unique
//! within one conversion run.

use std::collections::HashSet;

/// Substitutions applied in order, each to every character of its group.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\"':<>", ""),
    (",/().;=+ ", "_"),
    ("/", "__"),
    ("*", ""),
    ("?", ""),
    ("&", "and"),
    ("#", "_num_"),
    ("[", "LB_"),
    ("]", "_RB"),
];

/// Registry of every `url_name` handed out during one conversion run.
///
/// The registry must be shared by every component that mints identifiers
/// and must not be reset mid-run.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn `candidate` into a unique `url_name`.
    ///
    /// An empty candidate falls back to `tag`. On collision the name is
    /// prefixed with `tag_` (unless it already ends with `tag`) and then
    /// suffixed with `x` until unique.
    pub fn make_url_name(&mut self, candidate: &str, tag: &str) -> String {
        self.mint(candidate, tag, false, "")
    }

    /// Like [`make_url_name`](Self::make_url_name) but returns the sanitized
    /// name as-is even when it was handed out before.
    pub fn make_shared_url_name(&mut self, candidate: &str, tag: &str) -> String {
        self.mint(candidate, tag, true, "")
    }

    /// Full form with every option exposed.
    pub fn mint(
        &mut self,
        candidate: &str,
        tag: &str,
        allow_duplicate: bool,
        extra_allowed: &str,
    ) -> String {
        let mut name = sanitize(if candidate.is_empty() { tag } else { candidate }, extra_allowed);

        if !allow_duplicate {
            if self.names.contains(&name) && !name.ends_with(tag) {
                name = format!("{tag}_{name}");
            }
            while self.names.contains(&name) {
                name.push('x');
            }
        }

        self.names.insert(name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Apply the substitution table and strip characters outside the allowed set.
///
/// Never returns an empty string.
pub fn sanitize(s: &str, extra_allowed: &str) -> String {
    let mut s = s.to_string();
    for (chars, replacement) in SUBSTITUTIONS {
        for ch in chars.chars() {
            if s.contains(ch) {
                s = s.replace(ch, replacement);
            }
        }
    }

    if s.is_empty() {
        s.push('x');
    }

    let s: String = s
        .chars()
        .filter(|&c| is_allowed(c) || extra_allowed.contains(c))
        .collect();

    // Candidates made only of disallowed characters end up empty here.
    if s.is_empty() { "x".to_string() } else { s }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ')
}
