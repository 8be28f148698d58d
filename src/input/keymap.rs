//! Key → command lookup tables.
//!
//! Keys are single bytes. Each prompt has its own table; a byte that is not in
//! the table is an invalid key for that prompt.

use crate::pager::PageOp;
use crate::search::{LineFilter, SearchDirection};
use crate::store::Direction;

pub const KEY_CTRL_C: u8 = 0x03;
pub const KEY_ESCAPE: u8 = 0x1b;

/// What follows the filter prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFollowUp {
    /// Ask for a search direction (`,`)
    AskDirection,
    /// Start a global forward search right away (`.`)
    SearchForward,
}

/// Commands available in the default state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Page(PageOp),
    Commit(Direction),
    VisitRoot,
    GotoHead,
    Search {
        direction: SearchDirection,
        global: bool,
    },
    SearchWithFilter(FilterFollowUp),
    FullTextSearch,
    NextMatch,
    PreviousMatch,
    StopSearch,
    SavePlace,
    RestorePlace,
    MarkRangeBegin,
    MarkRangeEnd,
    ClearRange,
    ChangedFiles,
    Help,
    Quit,
}

/// Default-state bindings with their help text, in help order.
pub const DEFAULT_BINDINGS: &[(u8, Command, &str)] = &[
    (b'j', Command::Page(PageOp::LineDown), "forward line"),
    (b'k', Command::Page(PageOp::LineUp), "backward line"),
    (b'f', Command::Page(PageOp::PageDown), "forward page"),
    (b' ', Command::Page(PageOp::PageDown), "forward page"),
    (b'b', Command::Page(PageOp::PageUp), "backward page"),
    (b'g', Command::Page(PageOp::Top), "goto top of the commit"),
    (b'G', Command::Page(PageOp::Bottom), "goto bottom of the commit"),
    (b'J', Command::Commit(Direction::Older), "show previous (older) commit"),
    (b'K', Command::Commit(Direction::Newer), "show next (newer) commit"),
    (b'r', Command::VisitRoot, "show root commit"),
    (b'H', Command::GotoHead, "show head commit"),
    (
        b'/',
        Command::Search {
            direction: SearchDirection::Forward,
            global: true,
        },
        "global forward search",
    ),
    (
        b'?',
        Command::Search {
            direction: SearchDirection::Backward,
            global: true,
        },
        "global backward search",
    ),
    (
        b'\\',
        Command::Search {
            direction: SearchDirection::Forward,
            global: false,
        },
        "local forward search",
    ),
    (
        b'!',
        Command::Search {
            direction: SearchDirection::Backward,
            global: false,
        },
        "local backward search",
    ),
    (
        b',',
        Command::SearchWithFilter(FilterFollowUp::AskDirection),
        "search with filter",
    ),
    (
        b'.',
        Command::SearchWithFilter(FilterFollowUp::SearchForward),
        "global forward search with filter",
    ),
    (b't', Command::FullTextSearch, "full-text search of commit messages"),
    (b'n', Command::NextMatch, "next match"),
    (b'p', Command::PreviousMatch, "previous match"),
    (b's', Command::StopSearch, "stop search"),
    (b'm', Command::SavePlace, "save current place"),
    (b'o', Command::RestorePlace, "restore original place"),
    (b'[', Command::MarkRangeBegin, "mark begin of range"),
    (b']', Command::MarkRangeEnd, "mark end of range"),
    (b'c', Command::ClearRange, "clear range"),
    (b'l', Command::ChangedFiles, "show changed files"),
    (b'h', Command::Help, "help"),
    (b'q', Command::Quit, "quit"),
];

pub fn default_command(key: u8) -> Option<Command> {
    DEFAULT_BINDINGS
        .iter()
        .find(|(bound, _, _)| *bound == key)
        .map(|(_, command, _)| *command)
}

/// Direction prompt: `(direction, global)` for a key.
pub fn direction_command(key: u8) -> Option<(SearchDirection, bool)> {
    match key {
        b'/' => Some((SearchDirection::Forward, true)),
        b'?' => Some((SearchDirection::Backward, true)),
        b'\\' => Some((SearchDirection::Forward, false)),
        b'!' => Some((SearchDirection::Backward, false)),
        _ => None,
    }
}

/// Filter prompt lookup.
pub fn filter_command(key: u8) -> Option<LineFilter> {
    LineFilter::from_key(key)
}

/// Escape and Ctrl-C both cancel prompts and long-running work.
pub fn is_cancel(key: u8) -> bool {
    key == KEY_ESCAPE || key == KEY_CTRL_C
}

/// Help screen lines, one per default-state key.
pub fn help_lines() -> Vec<String> {
    let mut lines = vec![
        "keystrokes supported in default state".to_string(),
        String::new(),
    ];
    lines.extend(DEFAULT_BINDINGS.iter().map(|(key, _, desc)| {
        let shown = if *key == b' ' {
            "SPC".to_string()
        } else {
            char::from(*key).to_string()
        };
        format!("{shown}: {desc}")
    }));
    lines
}
