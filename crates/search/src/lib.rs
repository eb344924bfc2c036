//! Literal find/replace primitives shared by ScribePad front ends.
//!
//! The search term is always treated as a literal substring: regex
//! metacharacters are escaped before the pattern is compiled, and matching is
//! ASCII-case-insensitive. The crate exposes the compiled [`Matcher`], the
//! [`Match`] list it produces, the [`MatchCursor`] used for circular
//! navigation, and the single-pass replace primitive. All state derived from
//! a term or buffer change is regenerated wholesale; nothing is patched
//! incrementally.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Metacharacters that must be escaped so the term is handed to the pattern
/// engine as a literal.
const METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Non-fatal precondition failures. Each one surfaces to the user as a
/// transient notice and turns the triggering operation into a no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationWarning {
    #[error("search term is empty")]
    EmptyTerm,
    #[error("no matches found")]
    NoMatches,
    #[error("no match selected")]
    NoCurrentMatch,
    #[error("nothing to replace")]
    NothingToReplace,
}

/// A located occurrence of the search term.
///
/// `start..end` is a half-open byte range into the searched content; `text`
/// is the matched slice in its original case. `line` and `column` are
/// 1-based positions for result reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Escapes every regex metacharacter in `term`.
///
/// Applied before compilation so user-typed input can never produce a
/// malformed pattern.
pub fn escape_literal(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if METACHARACTERS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A search term compiled for case-insensitive literal matching.
#[derive(Clone, Debug)]
pub struct Matcher {
    term: String,
    pattern: Regex,
}

impl Matcher {
    /// Compiles the given literal term. The only rejected input is the empty
    /// term; everything else is escaped and therefore always compiles.
    pub fn new(term: impl Into<String>) -> Result<Self, ValidationWarning> {
        let term = term.into();
        if term.is_empty() {
            return Err(ValidationWarning::EmptyTerm);
        }
        let pattern = RegexBuilder::new(&escape_literal(&term))
            .case_insensitive(true)
            .build()
            .expect("escaped literal term always compiles");
        Ok(Self { term, pattern })
    }

    /// Returns the original (unescaped) search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Scans `content` left to right and returns every occurrence, ascending
    /// by start offset. Scanning resumes at the end of each match, so the
    /// results never overlap.
    pub fn find_all(&self, content: &str) -> Vec<Match> {
        let lines = LineIndex::new(content);
        self.pattern
            .find_iter(content)
            .map(|found| {
                let (line, column) = lines.line_and_column(found.start());
                Match {
                    start: found.start(),
                    end: found.end(),
                    text: found.as_str().to_string(),
                    line,
                    column,
                }
            })
            .collect()
    }

    /// Replaces every occurrence in a single left-to-right pass, returning
    /// the rewritten text and the number of replacements.
    ///
    /// The output is assembled segment by segment from the original content,
    /// so offsets of later matches are never invalidated mid-pass.
    pub fn replace_all(&self, content: &str, replacement: &str) -> (String, usize) {
        let mut replaced = String::with_capacity(content.len());
        let mut last = 0usize;
        let mut count = 0usize;
        for found in self.pattern.find_iter(content) {
            replaced.push_str(&content[last..found.start()]);
            replaced.push_str(replacement);
            last = found.end();
            count += 1;
        }
        replaced.push_str(&content[last..]);
        (replaced, count)
    }
}

/// Direction for stepping through the match list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl Default for SearchDirection {
    fn default() -> Self {
        Self::Forward
    }
}

/// Tracks the currently selected match and steps through the list
/// circularly in either direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchCursor {
    current: Option<usize>,
}

impl MatchCursor {
    /// Places the cursor on the first match, or clears it when the list is
    /// empty. Called after every fresh scan.
    pub fn reset(&mut self, match_count: usize) {
        self.current = if match_count == 0 { None } else { Some(0) };
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Returns the selected match index, if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Steps to the next or previous of `match_count` entries, wrapping at
    /// both ends. Returns the new index, or `None` (without moving) when the
    /// list is empty.
    pub fn step(&mut self, direction: SearchDirection, match_count: usize) -> Option<usize> {
        if match_count == 0 {
            return None;
        }
        let next = match (self.current, direction) {
            (None, SearchDirection::Forward) => 0,
            (None, SearchDirection::Backward) => match_count - 1,
            (Some(index), SearchDirection::Forward) => (index + 1) % match_count,
            (Some(index), SearchDirection::Backward) => (index + match_count - 1) % match_count,
        };
        self.current = Some(next);
        Some(next)
    }
}

/// Maps byte offsets to 1-based line/column pairs.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { text, starts }
    }

    fn line_and_column(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let column = self.text[self.starts[line]..offset].chars().count() + 1;
        (line + 1, column)
    }
}
