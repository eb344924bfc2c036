use scribepad_highlight::{render, DisplayDoc};
use scribepad_search::{Match, MatchCursor, Matcher, SearchDirection, ValidationWarning};

use crate::Document;

/// Severity of user feedback emitted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
}

/// Transient user feedback ("no matches found", "3 replaced", …).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(warning: &ValidationWarning) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: warning.to_string(),
        }
    }
}

/// Receives user feedback from the engine.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Consumes derived display structures and owns the scroll behaviour.
///
/// The engine pushes a fresh [`DisplayDoc`] after every operation that
/// changes what should be visible, then asks for the relevant highlight unit
/// to be scrolled into view.
pub trait Renderer {
    fn apply(&mut self, doc: &DisplayDoc);
    fn scroll_into_view(&mut self, unit: usize);
}

impl Renderer for () {
    fn apply(&mut self, _doc: &DisplayDoc) {}
    fn scroll_into_view(&mut self, _unit: usize) {}
}

impl Notifier for () {
    fn notify(&mut self, _notice: Notice) {}
}

/// Interactive find/replace session over a single document.
///
/// The session owns the canonical text buffer for its whole lifetime;
/// [`FindReplaceSession::into_document`] tears it down and hands the buffer
/// back. Every operation is synchronous and runs to completion: content
/// mutation and match recomputation happen in one uninterrupted step, and
/// the match list is always regenerated wholesale, never patched.
pub struct FindReplaceSession<R: Renderer, N: Notifier> {
    document: Document,
    term: String,
    replacement: String,
    matcher: Option<Matcher>,
    matches: Vec<Match>,
    cursor: MatchCursor,
    renderer: R,
    notifier: N,
}

impl<R: Renderer, N: Notifier> FindReplaceSession<R, N> {
    /// Creates a session owning `document`, wired to the given collaborators.
    pub fn new(document: Document, renderer: R, notifier: N) -> Self {
        Self {
            document,
            term: String::new(),
            replacement: String::new(),
            matcher: None,
            matches: Vec::new(),
            cursor: MatchCursor::default(),
            renderer,
            notifier,
        }
    }

    /// Ends the session and returns the document buffer.
    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// The current match list, ascending and non-overlapping.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Index of the selected match, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.current()
    }

    /// Derives the display structure for the current state.
    pub fn display(&self) -> DisplayDoc {
        render(self.document.contents(), &self.matches, self.cursor.current())
    }

    pub fn set_replacement(&mut self, replacement: impl Into<String>) {
        self.replacement = replacement.into();
    }

    /// Sets the search term and scans the buffer.
    ///
    /// An empty term clears all derived state without a warning. Zero
    /// matches warn "no matches found"; otherwise the first match becomes
    /// current and is scrolled into view.
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        let matcher = match Matcher::new(term.as_str()) {
            Ok(matcher) => matcher,
            Err(_) => {
                self.clear_term();
                return;
            }
        };
        self.term = term;
        self.matches = matcher.find_all(self.document.contents());
        self.matcher = Some(matcher);
        self.cursor.reset(self.matches.len());
        self.publish();
        if self.matches.is_empty() {
            self.notifier
                .notify(Notice::warning(&ValidationWarning::NoMatches));
        } else {
            self.renderer.scroll_into_view(0);
        }
    }

    /// Clears the term and every piece of derived state.
    pub fn clear_term(&mut self) {
        self.term.clear();
        self.matcher = None;
        self.matches.clear();
        self.cursor.clear();
        self.publish();
    }

    /// Selects the next match, wrapping past the end.
    pub fn find_next(&mut self) -> Option<usize> {
        self.navigate(SearchDirection::Forward)
    }

    /// Selects the previous match, wrapping past the start.
    pub fn find_previous(&mut self) -> Option<usize> {
        self.navigate(SearchDirection::Backward)
    }

    fn navigate(&mut self, direction: SearchDirection) -> Option<usize> {
        let moved = self.cursor.step(direction, self.matches.len())?;
        self.publish();
        self.renderer.scroll_into_view(moved);
        Some(moved)
    }

    /// Replaces the selected match and re-scans the buffer from scratch.
    ///
    /// Offsets after the edit point shift by the length difference between
    /// the replacement and the matched text; the re-scan recomputes them
    /// rather than patching. Returns the match that was replaced.
    pub fn replace_current(&mut self) -> Option<Match> {
        let index = match self.cursor.current() {
            Some(index) => index,
            None => {
                self.notifier
                    .notify(Notice::warning(&ValidationWarning::NoCurrentMatch));
                return None;
            }
        };
        let target = match self.matches.get(index) {
            Some(found) => found.clone(),
            None => {
                self.notifier
                    .notify(Notice::warning(&ValidationWarning::NoCurrentMatch));
                return None;
            }
        };

        let mut updated = self.document.contents().to_string();
        updated.replace_range(target.start..target.end, &self.replacement);
        self.document.set_contents(updated);

        self.rescan();
        self.notifier.notify(Notice::success("1 replaced"));
        Some(target)
    }

    /// Replaces every match in one pass and reports the count.
    ///
    /// Leaves the session without matches or a selection; occurrences the
    /// replacement may itself reintroduce are not highlighted until a fresh
    /// search.
    pub fn replace_all(&mut self) -> usize {
        let (replaced, count) = match &self.matcher {
            Some(matcher) if !self.matches.is_empty() => {
                matcher.replace_all(self.document.contents(), &self.replacement)
            }
            _ => {
                self.notifier
                    .notify(Notice::warning(&ValidationWarning::NothingToReplace));
                return 0;
            }
        };
        self.document.set_contents(replaced);
        self.matches.clear();
        self.cursor.clear();
        self.publish();
        self.notifier
            .notify(Notice::success(format!("{count} replaced")));
        count
    }

    /// Recomputes the match list after a buffer mutation. The result is a
    /// fresh search: the first match (if any) becomes current.
    fn rescan(&mut self) {
        let matches = match &self.matcher {
            Some(matcher) => matcher.find_all(self.document.contents()),
            None => Vec::new(),
        };
        self.matches = matches;
        self.cursor.reset(self.matches.len());
        self.publish();
        if !self.matches.is_empty() {
            self.renderer.scroll_into_view(0);
        }
    }

    fn publish(&mut self) {
        let doc = render(self.document.contents(), &self.matches, self.cursor.current());
        self.renderer.apply(&doc);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Recording collaborator shared between the session and the test body.
    #[derive(Clone, Default)]
    struct Probe {
        notices: Rc<RefCell<Vec<Notice>>>,
        scrolled: Rc<RefCell<Vec<usize>>>,
        applied: Rc<RefCell<Vec<DisplayDoc>>>,
    }

    impl Probe {
        fn warnings(&self) -> Vec<String> {
            self.notices
                .borrow()
                .iter()
                .filter(|notice| notice.kind == NoticeKind::Warning)
                .map(|notice| notice.message.clone())
                .collect()
        }

        fn successes(&self) -> Vec<String> {
            self.notices
                .borrow()
                .iter()
                .filter(|notice| notice.kind == NoticeKind::Success)
                .map(|notice| notice.message.clone())
                .collect()
        }
    }

    impl Renderer for Probe {
        fn apply(&mut self, doc: &DisplayDoc) {
            self.applied.borrow_mut().push(doc.clone());
        }

        fn scroll_into_view(&mut self, unit: usize) {
            self.scrolled.borrow_mut().push(unit);
        }
    }

    impl Notifier for Probe {
        fn notify(&mut self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }
    }

    fn session(content: &str) -> (FindReplaceSession<Probe, Probe>, Probe) {
        let probe = Probe::default();
        let session =
            FindReplaceSession::new(Document::from_text(content), probe.clone(), probe.clone());
        (session, probe)
    }

    #[test]
    fn search_selects_first_match_and_scrolls_to_it() {
        let (mut session, probe) = session("React is great. react makes UIs.");
        session.set_term("react");

        let offsets: Vec<_> = session
            .matches()
            .iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert_eq!(offsets, vec![(0, 5), (16, 21)]);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(*probe.scrolled.borrow(), vec![0]);
        assert!(probe.warnings().is_empty());
    }

    #[test]
    fn navigation_wraps_in_both_directions() {
        let (mut session, probe) = session("React is great. react makes UIs.");
        session.set_term("react");

        assert_eq!(session.find_next(), Some(1));
        assert_eq!(session.find_next(), Some(0));
        assert_eq!(session.find_previous(), Some(1));
        assert_eq!(*probe.scrolled.borrow(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn full_cycle_of_next_returns_to_start() {
        let (mut session, _probe) = session("a b a b a");
        session.set_term("a");
        let origin = session.current_index();
        for _ in 0..session.matches().len() {
            session.find_next();
        }
        assert_eq!(session.current_index(), origin);
    }

    #[test]
    fn navigation_is_a_noop_without_matches() {
        let (mut session, probe) = session("no hits here");
        session.set_term("xyz");
        assert_eq!(session.find_next(), None);
        assert_eq!(session.find_previous(), None);
        // Only the initial search scrolled nothing; navigation added nothing.
        assert!(probe.scrolled.borrow().is_empty());
    }

    #[test]
    fn replace_current_splices_and_rescans_from_scratch() {
        let (mut session, probe) = session("React is great. react makes UIs.");
        session.set_term("react");
        session.set_replacement("React.js");

        let replaced = session.replace_current().expect("match selected");
        assert_eq!((replaced.start, replaced.end), (0, 5));
        assert_eq!(
            session.document().contents(),
            "React.js is great. react makes UIs."
        );
        // The re-scan recomputes offsets: the second occurrence shifted by
        // len("React.js") - len("React") = 3, and the replacement's own
        // "React" prefix matches again at the start.
        let offsets: Vec<_> = session
            .matches()
            .iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert!(offsets.contains(&(19, 24)));
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(probe.successes(), vec!["1 replaced"]);
    }

    #[test]
    fn replace_current_with_neutral_replacement_leaves_one_match() {
        let (mut session, _probe) = session("foo bar foo");
        session.set_term("foo");
        session.set_replacement("baz");

        session.replace_current().expect("match selected");
        assert_eq!(session.document().contents(), "baz bar foo");
        let offsets: Vec<_> = session
            .matches()
            .iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert_eq!(offsets, vec![(8, 11)]);
    }

    #[test]
    fn replace_current_without_selection_warns() {
        let (mut session, probe) = session("text");
        session.set_replacement("new");
        assert!(session.replace_current().is_none());
        assert_eq!(probe.warnings(), vec!["no match selected"]);
        assert_eq!(session.document().contents(), "text");
    }

    #[test]
    fn replace_all_reports_count_and_resets_state() {
        let (mut session, probe) = session("react react react");
        session.set_term("react");
        session.set_replacement("Vue");

        assert_eq!(session.replace_all(), 3);
        assert_eq!(session.document().contents(), "Vue Vue Vue");
        assert!(session.matches().is_empty());
        assert_eq!(session.current_index(), None);
        assert_eq!(probe.successes(), vec!["3 replaced"]);
    }

    #[test]
    fn replace_all_does_not_rehighlight_reintroduced_matches() {
        let (mut session, _probe) = session("abc");
        session.set_term("abc");
        session.set_replacement("abcabc");

        assert_eq!(session.replace_all(), 1);
        assert_eq!(session.document().contents(), "abcabc");
        // The reintroduced occurrences stay unhighlighted until a new search.
        assert!(session.matches().is_empty());
        session.set_term("abc");
        assert_eq!(session.matches().len(), 2);
    }

    #[test]
    fn replace_all_without_matches_warns() {
        let (mut session, probe) = session("nothing relevant");
        session.set_term("absent");
        session.set_replacement("x");
        assert_eq!(session.replace_all(), 0);
        assert!(probe.warnings().contains(&"nothing to replace".to_string()));
        assert_eq!(session.document().contents(), "nothing relevant");
    }

    #[test]
    fn empty_term_clears_state_without_warning() {
        let (mut session, probe) = session("some text");
        session.set_term("text");
        assert_eq!(session.matches().len(), 1);

        session.set_term("");
        assert!(session.matches().is_empty());
        assert_eq!(session.current_index(), None);
        assert!(probe.warnings().is_empty());
    }

    #[test]
    fn zero_matches_warns_no_matches_found() {
        let (mut session, probe) = session("abc");
        session.set_term("xyz");
        assert!(session.matches().is_empty());
        assert_eq!(session.current_index(), None);
        assert_eq!(probe.warnings(), vec!["no matches found"]);
    }

    #[test]
    fn display_marks_only_the_current_unit_active() {
        use scribepad_highlight::{DisplaySpan, MatchState};

        let (mut session, _probe) = session("a b a");
        session.set_term("a");
        session.find_next();

        let doc = session.display();
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
    fn every_state_change_publishes_a_fresh_display() {
        let (mut session, probe) = session("a a");
        session.set_term("a");
        session.find_next();
        session.replace_all();
        // One publish per search, navigation, and replace-all.
        assert_eq!(probe.applied.borrow().len(), 3);
        assert!(probe.applied.borrow().last().unwrap().spans().len() <= 1);
    }
}
