//! Pager session: the single owner of all interactive state.
//!
//! Every keystroke goes through [`Session::handle_key`], which dispatches on the
//! current [`Mode`] and reports an [`Effect`] for the event loop. Long-running
//! work (global search, root visit) is advanced by [`Session::step`], one
//! commit per call, and is cancelled through a shared [`CancelToken`].

use crate::error::{LoglessError, Result};
use crate::input::keymap::{self, Command, FilterFollowUp};
use crate::pager::{PageOp, PageWindow};
use crate::search::{
    FullTextIndex, GlobalSearch, LineFilter, MemoryIndex, QueryInput, SearchDirection, SearchKind,
    SearchOutcome, SearchPhase, SearchState, StepResult,
};
use crate::store::{Advance, CommitStore, Direction, Place, RootWalk, WalkStep};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which prompt or view keystrokes currently go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default,
    EditingQuery,
    InputFilter(FilterFollowUp),
    InputDirection,
    ChangedFiles,
    Help,
}

/// What the event loop should do after a keystroke or step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Redraw,
    Quit,
}

/// Cooperative cancellation flag shared with the signal task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consume a pending request.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum LongRun {
    Search(GlobalSearch),
    RootVisit(RootWalk),
}

pub struct Session {
    store: CommitStore,
    search: SearchState,
    index: Box<dyn FullTextIndex>,
    mode: Mode,
    long_run: Option<LongRun>,
    cancel: CancelToken,
    pending_filter: LineFilter,
    saved_place: Option<Place>,
    message: String,
    rows: usize,
    cols: usize,
}

impl Session {
    pub fn new(store: CommitStore, query_limit: usize) -> Result<Self> {
        let mut session = Self {
            store,
            search: SearchState::new(query_limit),
            index: Box::new(MemoryIndex::new()),
            mode: Mode::Default,
            long_run: None,
            cancel: CancelToken::new(),
            pending_filter: LineFilter::Default,
            saved_place: None,
            message: String::new(),
            rows: 24,
            cols: 80,
        };
        session.settle()?;
        Ok(session)
    }

    pub fn with_index(mut self, index: Box<dyn FullTextIndex>) -> Self {
        self.index = index;
        self
    }

    /// Handle one keystroke.
    ///
    /// Recoverable errors become the status message and reset the mode; fatal
    /// errors are returned.
    pub fn handle_key(&mut self, key: u8) -> Result<Effect> {
        if self.long_run.is_some() {
            if keymap::is_cancel(key) {
                self.cancel.request();
            }
            return Ok(Effect::None);
        }

        let effect = match self.dispatch(key) {
            Err(err) if !err.is_fatal() => {
                log::debug!("recoverable input error: {err}");
                self.mode = Mode::Default;
                self.message = err.to_string();
                Effect::Redraw
            }
            other => other?,
        };
        if effect != Effect::Quit {
            self.settle()?;
        }
        Ok(effect)
    }

    /// Advance the long-running operation by one commit.
    pub fn step(&mut self) -> Result<Effect> {
        let Some(run) = self.long_run.take() else {
            return Ok(Effect::None);
        };

        if self.cancel.take() {
            match run {
                LongRun::Search(task) => {
                    task.cancel(&mut self.store);
                    self.search.cancel();
                    self.message = "search stopped".to_string();
                }
                LongRun::RootVisit(walk) => {
                    walk.cancel(&mut self.store);
                    self.message = "stop visiting root commit".to_string();
                }
            }
            log::info!("{}", self.message);
            self.settle()?;
            return Ok(Effect::Redraw);
        }

        match run {
            LongRun::Search(mut task) => {
                match task.step(&mut self.store, &self.search, self.index.as_mut())? {
                    StepResult::Continue => {
                        self.long_run = Some(LongRun::Search(task));
                        return Ok(Effect::None);
                    }
                    StepResult::Found => self.message = self.search.prompt(),
                    StepResult::NotFound => self.report_not_found(),
                }
            }
            LongRun::RootVisit(mut walk) => match walk.step(&mut self.store)? {
                WalkStep::Continue => {
                    self.long_run = Some(LongRun::RootVisit(walk));
                    return Ok(Effect::None);
                }
                WalkStep::Done => self.message.clear(),
            },
        }
        self.settle()?;
        Ok(Effect::Redraw)
    }

    /// Scroll the current commit by `delta` lines (mouse wheel).
    pub fn scroll(&mut self, delta: isize) -> Result<Effect> {
        if self.long_run.is_some() || self.mode != Mode::Default {
            return Ok(Effect::None);
        }
        self.move_window(|window| window.scroll_lines(delta))
    }

    /// Terminal size changed.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = usize::from(cols);
        self.rows = usize::from(rows);
    }

    /// Lines available for commit text: the terminal minus the status line
    /// and, when shown, the message line.
    pub fn page_height(&self) -> usize {
        let reserved = 1 + usize::from(!self.message.is_empty());
        self.rows.saturating_sub(reserved).max(1)
    }

    pub fn is_busy(&self) -> bool {
        self.long_run.is_some()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn saved_place(&self) -> Option<Place> {
        self.saved_place
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn dispatch(&mut self, key: u8) -> Result<Effect> {
        match self.mode {
            Mode::Default => match keymap::default_command(key) {
                Some(command) => self.run_command(command),
                None => Ok(Effect::None),
            },
            Mode::EditingQuery => self.edit_query(key),
            Mode::InputFilter(follow_up) => self.choose_filter(key, follow_up),
            Mode::InputDirection => self.choose_direction(key),
            Mode::ChangedFiles | Mode::Help => {
                if key == b'q' {
                    self.mode = Mode::Default;
                    Ok(Effect::Redraw)
                } else {
                    Ok(Effect::None)
                }
            }
        }
    }

    fn run_command(&mut self, command: Command) -> Result<Effect> {
        match command {
            Command::Page(op) => self.page(op),
            Command::Commit(direction) => self.show_commit(direction),
            Command::VisitRoot => {
                if let Some(root) = self.store.known_root() {
                    self.store.jump(root);
                } else {
                    self.cancel.take();
                    self.long_run = Some(LongRun::RootVisit(RootWalk::start(&self.store)));
                    self.message = "visiting root commit...".to_string();
                }
                Ok(Effect::Redraw)
            }
            Command::GotoHead => Ok(redraw_if(self.store.goto_head())),
            Command::Search { direction, global } => {
                self.begin_query(direction, global, SearchKind::Regex, LineFilter::Default);
                Ok(Effect::Redraw)
            }
            Command::SearchWithFilter(follow_up) => {
                self.mode = Mode::InputFilter(follow_up);
                self.message =
                    "input search filter(m(modified), a(at line), f(+++, ---), l(commit message)): "
                        .to_string();
                Ok(Effect::Redraw)
            }
            Command::FullTextSearch => {
                self.begin_query(
                    SearchDirection::Forward,
                    true,
                    SearchKind::FullText,
                    LineFilter::Default,
                );
                Ok(Effect::Redraw)
            }
            Command::NextMatch => self.progress(SearchDirection::Forward),
            Command::PreviousMatch => self.progress(SearchDirection::Backward),
            Command::StopSearch => {
                if self.search.phase() == SearchPhase::Searching {
                    self.search.stop();
                    self.message.clear();
                }
                Ok(Effect::Redraw)
            }
            Command::SavePlace => {
                self.saved_place = Some(self.store.place());
                self.message = "saved current as original place".to_string();
                Ok(Effect::Redraw)
            }
            Command::RestorePlace => match self.saved_place {
                Some(place) => {
                    self.store.restore(place);
                    self.message = "restored original place".to_string();
                    Ok(Effect::Redraw)
                }
                None => Ok(Effect::None),
            },
            Command::MarkRangeBegin => {
                self.message = self.store.mark_range_begin().message().to_string();
                Ok(Effect::Redraw)
            }
            Command::MarkRangeEnd => {
                self.message = self.store.mark_range_end().message().to_string();
                Ok(Effect::Redraw)
            }
            Command::ClearRange => {
                self.message = self.store.clear_range().message().to_string();
                Ok(Effect::Redraw)
            }
            Command::ChangedFiles => {
                self.mode = Mode::ChangedFiles;
                Ok(Effect::Redraw)
            }
            Command::Help => {
                self.mode = Mode::Help;
                Ok(Effect::Redraw)
            }
            Command::Quit => Ok(Effect::Quit),
        }
    }

    fn page(&mut self, op: PageOp) -> Result<Effect> {
        self.move_window(|window| window.apply(op))
    }

    /// Apply a paginator operation to the current commit's window.
    fn move_window(&mut self, op: impl FnOnce(&mut PageWindow) -> bool) -> Result<Effect> {
        self.store.materialize_current()?;
        let height = self.page_height();
        let node = self.store.current_node_mut();
        let Some(line_count) = node.line_count() else {
            return Ok(Effect::None);
        };
        let mut window = PageWindow::new(node.head_line, line_count, height);
        let changed = op(&mut window);
        node.head_line = window.head_line;
        Ok(redraw_if(changed))
    }

    fn show_commit(&mut self, direction: Direction) -> Result<Effect> {
        match self.store.advance(direction)? {
            Advance::Moved(_) => Ok(Effect::Redraw),
            Advance::RangeBound => {
                self.message = match direction {
                    Direction::Older => "begin of range...",
                    Direction::Newer => "end of range...",
                }
                .to_string();
                Ok(Effect::Redraw)
            }
            Advance::EndOfChain => Ok(Effect::None),
        }
    }

    fn begin_query(
        &mut self,
        direction: SearchDirection,
        global: bool,
        kind: SearchKind,
        filter: LineFilter,
    ) {
        self.search.begin_query(direction, global, kind, filter);
        self.mode = Mode::EditingQuery;
        self.message = self.search.prompt();
    }

    fn edit_query(&mut self, key: u8) -> Result<Effect> {
        if keymap::is_cancel(key) {
            self.search.cancel();
            self.mode = Mode::Default;
            self.message.clear();
            return Ok(Effect::Redraw);
        }

        match self.search.push_key(key)? {
            QueryInput::Edited => {
                self.message = self.search.prompt();
                Ok(Effect::Redraw)
            }
            QueryInput::Submitted => {
                self.mode = Mode::Default;
                self.saved_place = Some(self.store.place());
                self.run_search(self.search.direction(), self.search.global(), false)
            }
        }
    }

    fn choose_filter(&mut self, key: u8, follow_up: FilterFollowUp) -> Result<Effect> {
        if keymap::is_cancel(key) {
            self.mode = Mode::Default;
            self.message.clear();
            return Ok(Effect::Redraw);
        }
        let filter = keymap::filter_command(key).ok_or(LoglessError::InvalidKey {
            prompt: "invalid search type",
            key: char::from(key),
        })?;

        match follow_up {
            FilterFollowUp::AskDirection => {
                self.pending_filter = filter;
                self.mode = Mode::InputDirection;
                self.message = format!(
                    "type: {}, input search direction (/, ?, \\, !):",
                    filter.label()
                );
            }
            FilterFollowUp::SearchForward => {
                self.begin_query(SearchDirection::Forward, true, SearchKind::Regex, filter);
            }
        }
        Ok(Effect::Redraw)
    }

    fn choose_direction(&mut self, key: u8) -> Result<Effect> {
        if keymap::is_cancel(key) {
            self.pending_filter = LineFilter::Default;
            self.mode = Mode::Default;
            self.message.clear();
            return Ok(Effect::Redraw);
        }
        let (direction, global) =
            keymap::direction_command(key).ok_or(LoglessError::InvalidKey {
                prompt: "invalid direction specifier",
                key: char::from(key),
            })?;

        let filter = std::mem::take(&mut self.pending_filter);
        self.begin_query(direction, global, SearchKind::Regex, filter);
        Ok(Effect::Redraw)
    }

    /// `n` / `p`: continue the active search past the cursor.
    fn progress(&mut self, direction: SearchDirection) -> Result<Effect> {
        if self.search.phase() != SearchPhase::Searching {
            return Ok(Effect::None);
        }
        self.run_search(direction, self.search.global(), true)
    }

    fn run_search(
        &mut self,
        direction: SearchDirection,
        global: bool,
        progressive: bool,
    ) -> Result<Effect> {
        let outcome = GlobalSearch::start(
            &mut self.store,
            direction,
            global,
            progressive,
            &self.search,
            self.index.as_mut(),
        )?;
        match outcome {
            SearchOutcome::Found => self.message = self.search.prompt(),
            SearchOutcome::NotFound => self.report_not_found(),
            SearchOutcome::Running(task) => {
                self.cancel.take();
                self.long_run = Some(LongRun::Search(task));
                self.message = self.search.prompt();
            }
        }
        Ok(Effect::Redraw)
    }

    fn report_not_found(&mut self) {
        self.message = format!("not found: {}", self.search.query());
    }

    /// Keep the current commit resident for display.
    fn settle(&mut self) -> Result<()> {
        self.store.materialize_current()?;
        Ok(())
    }
}

fn redraw_if(changed: bool) -> Effect {
    if changed {
        Effect::Redraw
    } else {
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheManager;
    use crate::commit::CommitId;
    use crate::source::StaticSource;
    use crate::stream::IdStreamReader;
    use std::io::Cursor;

    fn id(n: usize) -> CommitId {
        CommitId::parse(format!("{n:040x}").as_bytes()).unwrap()
    }

    /// Commits whose bodies are `bodies[i]`, HEAD first.
    fn session(bodies: &[&str]) -> Session {
        let mut source = StaticSource::new();
        let mut ids = String::new();
        for (n, body) in bodies.iter().enumerate() {
            source.insert(id(n), format!("commit {}\n\n    subject {n}\n\n{body}", id(n)));
            ids.push_str(&format!("{}\n", id(n)));
        }
        let reader = IdStreamReader::new(Cursor::new(ids.into_bytes()));
        let store =
            CommitStore::open(Box::new(reader), Box::new(source), CacheManager::new(1 << 20))
                .unwrap();
        Session::new(store, 128).unwrap()
    }

    fn keys(session: &mut Session, keys: &str) {
        for key in keys.bytes() {
            session.handle_key(key).unwrap();
        }
    }

    fn drain(session: &mut Session) {
        while session.is_busy() {
            session.step().unwrap();
        }
    }

    #[test]
    fn test_local_search_moves_cursor() {
        let mut session = session(&["+alpha\n+needle here\n"]);
        keys(&mut session, "\\NEEDLE\r");
        assert_eq!(session.store().current_node().head_line, 5);
        assert_eq!(session.search().phase(), SearchPhase::Searching);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_global_search_walks_commits() {
        let mut session = session(&["+a\n", "+b\n", "+needle\n"]);
        keys(&mut session, "/needle\r");
        assert!(session.is_busy());
        drain(&mut session);
        assert_eq!(session.store().current(), 2);
        assert_eq!(session.store().current_node().head_line, 4);
        assert_eq!(session.saved_place().map(|p| p.node), Some(0));

        keys(&mut session, "o");
        assert_eq!(session.store().current(), 0);
        assert_eq!(session.message(), "restored original place");
    }

    #[test]
    fn test_next_and_previous_match() {
        let mut session = session(&["+x1\n+x2\n"]);
        keys(&mut session, "\\x\r");
        assert_eq!(session.store().current_node().head_line, 4);
        keys(&mut session, "n");
        assert_eq!(session.store().current_node().head_line, 5);
        keys(&mut session, "p");
        assert_eq!(session.store().current_node().head_line, 4);
    }

    #[test]
    fn test_not_found_restores_position() {
        let mut session = session(&["+a\n", "+b\n", "+c\n"]);
        session.resize(80, 3);
        keys(&mut session, "j/absent\r");
        drain(&mut session);
        assert_eq!(session.store().current(), 0);
        assert_eq!(session.store().current_node().head_line, 1);
        assert_eq!(session.message(), "not found: absent");
    }

    #[test]
    fn test_cancel_restores_position() {
        let mut session = session(&["+a\n", "+b\n", "+c\n", "+d\n"]);
        session.resize(80, 3);
        keys(&mut session, "jjj/absent\r");
        assert!(session.is_busy());
        session.step().unwrap();
        assert_ne!(session.store().current(), 0);

        session.handle_key(keymap::KEY_ESCAPE).unwrap();
        assert_eq!(session.step().unwrap(), Effect::Redraw);
        assert!(!session.is_busy());
        assert_eq!(session.store().current(), 0);
        assert_eq!(session.store().current_node().head_line, 3);
        assert_eq!(session.message(), "search stopped");
        assert_eq!(session.search().phase(), SearchPhase::Idle);
        assert!(session.search().matcher().is_none());
        assert_eq!(session.handle_key(b'n').unwrap(), Effect::None);
    }

    #[test]
    fn test_cancel_root_visit_keeps_search() {
        let mut session = session(&["+x\n", "+a\n", "+b\n"]);
        keys(&mut session, "\\x\r");
        assert_eq!(session.search().phase(), SearchPhase::Searching);

        keys(&mut session, "r");
        assert!(session.is_busy());
        session.cancel_token().request();
        session.step().unwrap();
        assert_eq!(session.message(), "stop visiting root commit");
        assert_eq!(session.search().phase(), SearchPhase::Searching);
    }

    #[test]
    fn test_filter_then_direction() {
        let mut session = session(&["    needle in context\n+needle added\n"]);
        keys(&mut session, ",m");
        assert_eq!(session.mode(), Mode::InputDirection);
        keys(&mut session, "\\needle\r");
        assert_eq!(session.store().current_node().head_line, 5);
        assert_eq!(session.search().filter(), LineFilter::Modified);
    }

    #[test]
    fn test_invalid_filter_key_is_recoverable() {
        let mut session = session(&["+a\n"]);
        keys(&mut session, ",z");
        assert_eq!(session.mode(), Mode::Default);
        assert_eq!(session.message(), "invalid search type: z");

        keys(&mut session, ",m*");
        assert_eq!(session.message(), "invalid direction specifier: *");
    }

    #[test]
    fn test_query_too_long_is_recoverable() {
        let mut session = session(&["+a\n"]);
        keys(&mut session, "/");
        for _ in 0..200 {
            session.handle_key(b'x').unwrap();
        }
        assert_eq!(session.mode(), Mode::Default);
        assert!(session.message().starts_with("search query is too long!"));
    }

    #[test]
    fn test_full_text_search() {
        let mut session = session(&["+a\n", "+b\n"]);
        keys(&mut session, "tsubject 1\r");
        drain(&mut session);
        assert_eq!(session.store().current(), 1);
        assert_eq!(session.store().current_node().head_line, 0);
    }

    #[test]
    fn test_commit_navigation_and_range_messages() {
        let mut session = session(&["+a\n", "+b\n", "+c\n"]);
        keys(&mut session, "]J[");
        assert_eq!(session.message(), "range specified");
        keys(&mut session, "J");
        assert_eq!(session.message(), "begin of range...");
        keys(&mut session, "KK");
        assert_eq!(session.message(), "end of range...");
        keys(&mut session, "c");
        assert_eq!(session.message(), "range cleared");
    }

    #[test]
    fn test_visit_root_and_views() {
        let mut session = session(&["+a\n", "+b\n", "+c\n"]);
        keys(&mut session, "r");
        assert!(session.is_busy());
        drain(&mut session);
        assert_eq!(session.store().current(), 2);
        assert_eq!(session.message(), "");

        keys(&mut session, "H");
        assert_eq!(session.store().current(), 0);
        keys(&mut session, "l");
        assert_eq!(session.mode(), Mode::ChangedFiles);
        keys(&mut session, "jq");
        assert_eq!(session.mode(), Mode::Default);
        assert_eq!(session.handle_key(b'q').unwrap(), Effect::Quit);
    }

    #[test]
    fn test_paging_reports_changes() {
        let body: String = (0..50).map(|n| format!("+line {n}\n")).collect();
        let mut session = session(&[body.as_str()]);
        session.resize(80, 11);
        assert_eq!(session.handle_key(b'f').unwrap(), Effect::Redraw);
        assert_eq!(session.store().current_node().head_line, 10);
        assert_eq!(session.handle_key(b'G').unwrap(), Effect::Redraw);
        assert_eq!(session.handle_key(b'G').unwrap(), Effect::None);
        assert_eq!(session.handle_key(b'g').unwrap(), Effect::Redraw);
        assert_eq!(session.store().current_node().head_line, 0);
    }
}
