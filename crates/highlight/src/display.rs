use std::ops::Range;

use scribepad_search::Match;

use crate::style::MatchPalette;

/// Styling state of a highlighted span: the span under the current match
/// index is active, every other match is inactive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchState {
    Active,
    Inactive,
}

/// One contiguous run of display text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplaySpan {
    /// Unmatched text between highlights.
    Text(Range<usize>),
    /// A highlighted match. `id` is the match's stable index in the match
    /// list and doubles as the scroll target identifier.
    Highlight {
        id: usize,
        range: Range<usize>,
        state: MatchState,
    },
}

impl DisplaySpan {
    /// Returns the byte range this span covers.
    pub fn range(&self) -> Range<usize> {
        match self {
            DisplaySpan::Text(range) => range.clone(),
            DisplaySpan::Highlight { range, .. } => range.clone(),
        }
    }
}

/// Derived display structure: a snapshot of the content partitioned into
/// plain and highlighted spans. Always rebuilt wholesale from
/// `(content, matches, current)`, never patched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayDoc {
    text: String,
    spans: Vec<DisplaySpan>,
    current: Option<usize>,
}

impl DisplayDoc {
    /// The content snapshot the spans index into.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The spans in ascending offset order, tiling the whole text.
    pub fn spans(&self) -> &[DisplaySpan] {
        &self.spans
    }

    /// The id of the active highlight, if any.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// The slice of text a span covers.
    pub fn span_text(&self, span: &DisplaySpan) -> &str {
        &self.text[span.range()]
    }
}

/// Partitions `content` into plain and highlighted spans.
///
/// `matches` must be sorted ascending and non-overlapping, which the matcher
/// guarantees. The match at `current` is styled active, all others inactive.
pub fn render(content: &str, matches: &[Match], current: Option<usize>) -> DisplayDoc {
    let mut spans = Vec::with_capacity(matches.len() * 2 + 1);
    let mut pos = 0usize;
    for (id, m) in matches.iter().enumerate() {
        if m.start > pos {
            spans.push(DisplaySpan::Text(pos..m.start));
        }
        let state = if current == Some(id) {
            MatchState::Active
        } else {
            MatchState::Inactive
        };
        spans.push(DisplaySpan::Highlight {
            id,
            range: m.start..m.end,
            state,
        });
        pos = m.end;
    }
    if pos < content.len() {
        spans.push(DisplaySpan::Text(pos..content.len()));
    }
    DisplayDoc {
        text: content.to_string(),
        spans,
        current,
    }
}

/// Marker strings wrapped around highlighted spans when producing annotated
/// display text.
#[derive(Clone, Debug)]
pub struct MarkerSet {
    pub active_open: String,
    pub active_close: String,
    pub inactive_open: String,
    pub inactive_close: String,
}

impl MarkerSet {
    /// Plain-text markers: `[[…]]` around the active match, `[…]` around the
    /// others.
    pub fn brackets() -> Self {
        Self {
            active_open: "[[".to_string(),
            active_close: "]]".to_string(),
            inactive_open: "[".to_string(),
            inactive_close: "]".to_string(),
        }
    }

    /// ANSI truecolor markers derived from the palette.
    pub fn ansi(palette: &MatchPalette) -> Self {
        let reset = "\x1b[0m".to_string();
        Self {
            active_open: palette.style_for(MatchState::Active).sgr_sequence(),
            active_close: reset.clone(),
            inactive_open: palette.style_for(MatchState::Inactive).sgr_sequence(),
            inactive_close: reset,
        }
    }
}

/// Builds annotated display text by inserting markers around each match.
///
/// Matches are processed in descending offset order so each insertion leaves
/// the offsets of the not-yet-processed spans valid.
pub fn annotate(
    content: &str,
    matches: &[Match],
    current: Option<usize>,
    markers: &MarkerSet,
) -> String {
    let mut annotated = content.to_string();
    for (id, m) in matches.iter().enumerate().rev() {
        let (open, close) = if current == Some(id) {
            (&markers.active_open, &markers.active_close)
        } else {
            (&markers.inactive_open, &markers.inactive_close)
        };
        annotated.insert_str(m.end, close);
        annotated.insert_str(m.start, open);
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribepad_search::Matcher;

    const CONTENT: &str = "React is great. react makes UIs.";

    fn matches_for(term: &str, content: &str) -> Vec<Match> {
        Matcher::new(term).unwrap().find_all(content)
    }

    #[test]
    fn spans_tile_the_whole_content() {
        let matches = matches_for("react", CONTENT);
        let doc = render(CONTENT, &matches, Some(0));
        let mut pos = 0;
        for span in doc.spans() {
            let range = span.range();
            assert_eq!(range.start, pos);
            pos = range.end;
        }
        assert_eq!(pos, CONTENT.len());
    }

    #[test]
    fn current_match_is_active_others_inactive() {
        let matches = matches_for("react", CONTENT);
        let doc = render(CONTENT, &matches, Some(1));
        let states: Vec<_> = doc
            .spans()
            .iter()
            .filter_map(|span| match span {
                DisplaySpan::Highlight { id, state, .. } => Some((*id, *state)),
                DisplaySpan::Text(_) => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![(0, MatchState::Inactive), (1, MatchState::Active)]
        );
    }

    #[test]
    fn no_matches_yields_one_text_span() {
        let doc = render(CONTENT, &[], None);
        assert_eq!(doc.spans(), &[DisplaySpan::Text(0..CONTENT.len())]);
        assert_eq!(doc.current(), None);
    }

    #[test]
    fn empty_content_yields_no_spans() {
        let doc = render("", &[], None);
        assert!(doc.spans().is_empty());
    }

    #[test]
    fn span_text_returns_the_covered_slice() {
        let matches = matches_for("react", CONTENT);
        let doc = render(CONTENT, &matches, Some(0));
        let highlighted: Vec<_> = doc
            .spans()
            .iter()
            .filter(|span| matches!(span, DisplaySpan::Highlight { .. }))
            .map(|span| doc.span_text(span))
            .collect();
        assert_eq!(highlighted, vec!["React", "react"]);
    }

    #[test]
    fn adjacent_matches_produce_no_empty_text_spans() {
        let content = "aaaa";
        let matches = matches_for("aa", content);
        let doc = render(content, &matches, Some(0));
        assert_eq!(doc.spans().len(), 2);
        assert!(doc
            .spans()
            .iter()
            .all(|span| !span.range().is_empty()));
    }

    #[test]
    fn annotate_wraps_active_and_inactive_differently() {
        let matches = matches_for("react", CONTENT);
        let annotated = annotate(CONTENT, &matches, Some(0), &MarkerSet::brackets());
        assert_eq!(annotated, "[[React]] is great. [react] makes UIs.");
    }

    #[test]
    fn annotate_keeps_earlier_offsets_valid() {
        let content = "a b a b a";
        let matches = matches_for("a", content);
        let annotated = annotate(content, &matches, Some(2), &MarkerSet::brackets());
        assert_eq!(annotated, "[a] b [a] b [[a]]");
    }

    #[test]
    fn ansi_markers_reset_after_each_span() {
        let matches = matches_for("react", CONTENT);
        let markers = MarkerSet::ansi(crate::style::default_palette());
        let annotated = annotate(CONTENT, &matches, Some(0), &markers);
        assert_eq!(annotated.matches("\x1b[0m").count(), 2);
        assert!(annotated.starts_with(&markers.active_open));
    }
}
