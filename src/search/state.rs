//! Query editing and search phase tracking.

use crate::error::{LoglessError, Result};
use crate::search::matcher::{LineFilter, Matcher, SearchKind};
use crate::search::SearchDirection;

/// Default maximum query length in bytes.
pub const DEFAULT_QUERY_LIMIT: usize = 128;

const KEY_ENTER: u8 = 0x0d;
const KEY_NEWLINE: u8 = b'\n';
const KEY_BACKSPACE: u8 = 0x7f;
const KEY_DELETE: u8 = 0x08;

/// Search lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    EditingQuery,
    /// A query is compiled; `n`/`p` continue from the cursor
    Searching,
}

/// What a keystroke did to the query being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryInput {
    Edited,
    Submitted,
}

/// Query buffer, search parameters and the compiled matcher.
#[derive(Debug)]
pub struct SearchState {
    phase: SearchPhase,
    query: String,
    limit: usize,
    direction: SearchDirection,
    global: bool,
    kind: SearchKind,
    filter: LineFilter,
    matcher: Option<Matcher>,
}

impl SearchState {
    pub fn new(limit: usize) -> Self {
        Self {
            phase: SearchPhase::Idle,
            query: String::new(),
            limit,
            direction: SearchDirection::Forward,
            global: true,
            kind: SearchKind::Regex,
            filter: LineFilter::Default,
            matcher: None,
        }
    }

    /// Start editing a fresh query.
    pub fn begin_query(
        &mut self,
        direction: SearchDirection,
        global: bool,
        kind: SearchKind,
        filter: LineFilter,
    ) {
        self.phase = SearchPhase::EditingQuery;
        self.query.clear();
        self.direction = direction;
        self.global = global;
        self.kind = kind;
        self.filter = filter;
        self.matcher = None;
    }

    /// Feed one keystroke to the query editor.
    ///
    /// Overflowing the limit or submitting an invalid pattern drops back to
    /// `Idle` with a recoverable error.
    pub fn push_key(&mut self, key: u8) -> Result<QueryInput> {
        match key {
            KEY_ENTER | KEY_NEWLINE => {
                match Matcher::compile(self.kind, &self.query) {
                    Ok(matcher) => {
                        self.matcher = Some(matcher);
                        self.phase = SearchPhase::Searching;
                        log::debug!("compiled {} query {:?}", self.kind.label(), self.query);
                        Ok(QueryInput::Submitted)
                    }
                    Err(err) => {
                        self.cancel();
                        Err(err)
                    }
                }
            }
            KEY_BACKSPACE | KEY_DELETE => {
                self.query.pop();
                Ok(QueryInput::Edited)
            }
            _ => {
                if self.query.len() + 1 >= self.limit {
                    self.cancel();
                    return Err(LoglessError::QueryTooLong { limit: self.limit });
                }
                self.query.push(char::from(key));
                Ok(QueryInput::Edited)
            }
        }
    }

    /// Drop the query and matcher and return to `Idle`.
    pub fn cancel(&mut self) {
        self.phase = SearchPhase::Idle;
        self.query.clear();
        self.filter = LineFilter::Default;
        self.matcher = None;
    }

    /// Leave `Searching`, keeping nothing highlighted.
    pub fn stop(&mut self) {
        if self.phase == SearchPhase::Searching {
            self.phase = SearchPhase::Idle;
        }
    }

    /// Prompt shown in the status line while editing or searching.
    pub fn prompt(&self) -> String {
        format!(
            "{} {} search (filter: {}, type: {}): {}",
            match self.direction {
                SearchDirection::Forward => "forward",
                SearchDirection::Backward => "backward",
            },
            if self.global { "global" } else { "local" },
            self.filter.label(),
            self.kind.label(),
            self.query
        )
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn global(&self) -> bool {
        self.global
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn filter(&self) -> LineFilter {
        self.filter
    }

    /// The compiled matcher while `Searching`.
    pub fn matcher(&self) -> Option<&Matcher> {
        match self.phase {
            SearchPhase::Searching => self.matcher.as_ref(),
            _ => None,
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(state: &mut SearchState, text: &str) {
        for byte in text.bytes() {
            state.push_key(byte).unwrap();
        }
    }

    #[test]
    fn test_edit_and_submit() {
        let mut state = SearchState::default();
        state.begin_query(
            SearchDirection::Forward,
            true,
            SearchKind::Regex,
            LineFilter::Default,
        );
        typed(&mut state, "froo");
        state.push_key(KEY_BACKSPACE).unwrap();
        typed(&mut state, "b");
        assert_eq!(
            state.prompt(),
            "forward global search (filter: default, type: regex): frob"
        );
        assert!(state.matcher().is_none());

        assert_eq!(state.push_key(KEY_ENTER).unwrap(), QueryInput::Submitted);
        assert_eq!(state.phase(), SearchPhase::Searching);
        assert!(state.matcher().unwrap().is_match(b"FROB"));

        state.stop();
        assert_eq!(state.phase(), SearchPhase::Idle);
        assert!(state.matcher().is_none());
    }

    #[test]
    fn test_query_too_long_aborts() {
        let mut state = SearchState::new(4);
        state.begin_query(
            SearchDirection::Backward,
            false,
            SearchKind::Regex,
            LineFilter::Modified,
        );
        typed(&mut state, "abc");
        let err = state.push_key(b'd').unwrap_err();
        assert!(matches!(err, LoglessError::QueryTooLong { limit: 4 }));
        assert!(!err.is_fatal());
        assert_eq!(state.phase(), SearchPhase::Idle);
        assert_eq!(state.filter(), LineFilter::Default);
    }

    #[test]
    fn test_invalid_pattern_returns_to_idle() {
        let mut state = SearchState::default();
        state.begin_query(
            SearchDirection::Forward,
            true,
            SearchKind::Regex,
            LineFilter::Default,
        );
        typed(&mut state, "[");
        assert!(state.push_key(KEY_ENTER).is_err());
        assert_eq!(state.phase(), SearchPhase::Idle);
    }

    #[test]
    fn test_cancel_releases_matcher() {
        let mut state = SearchState::default();
        state.begin_query(
            SearchDirection::Forward,
            true,
            SearchKind::FullText,
            LineFilter::Default,
        );
        typed(&mut state, "fix\r");
        assert_eq!(state.phase(), SearchPhase::Searching);
        state.cancel();
        assert!(state.matcher().is_none());
        assert_eq!(state.query(), "");
    }
}
