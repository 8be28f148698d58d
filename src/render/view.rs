//! Render snapshots built from the session.
//!
//! The renderer never touches the commit store; it draws a [`ViewState`]
//! assembled here from the current commit's visible lines, the active search
//! matcher and the status/message lines.

use crate::input::keymap;
use crate::pager::PageWindow;
use crate::search::Matcher;
use crate::session::{Mode, Session};
use bstr::ByteSlice;

/// Longest summary shown in the status line.
const SUMMARY_WIDTH: usize = 80;
const TAB_WIDTH: usize = 8;

/// What occupies the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Commit,
    ChangedFiles,
    Help,
}

/// Coloring class of a line, decided by its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    CommitHeader,
    Added,
    Removed,
    Hunk,
    Plain,
}

impl LineKind {
    pub fn classify(line: &[u8]) -> Self {
        match line.first() {
            Some(b'+') => Self::Added,
            Some(b'-') => Self::Removed,
            Some(b'@') => Self::Hunk,
            Some(b'c') if line.starts_with(b"commit ") => Self::CommitHeader,
            _ => Self::Plain,
        }
    }
}

/// One content row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub text: String,
    pub kind: LineKind,
    /// Byte ranges of search matches within `text`
    pub highlights: Vec<(usize, usize)>,
}

impl ViewLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::Plain,
            highlights: Vec::new(),
        }
    }
}

/// Position and identity of the shown commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub percent: usize,
    pub shown: usize,
    pub total: usize,
    pub short_id: String,
    pub summary: String,
}

impl StatusLine {
    /// `NN% (shown/total)   1234abcd: summary`
    pub fn format(&self) -> String {
        format!(
            "{}% ({}/{})   {}: {}",
            self.percent, self.shown, self.total, self.short_id, self.summary
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub screen: Screen,
    pub lines: Vec<ViewLine>,
    pub status: StatusLine,
    pub message: Option<String>,
    pub cols: usize,
    pub rows: usize,
}

impl ViewState {
    pub fn from_session(session: &Session) -> Self {
        let store = session.store();
        let node = store.current_node();
        let height = session.page_height();

        let line_count = node.line_count().unwrap_or(0);
        let window = PageWindow::new(node.head_line, line_count, height);
        let status = StatusLine {
            percent: window.percent(),
            shown: window.end_line(),
            total: line_count,
            short_id: node.commit_id().short().to_string(),
            summary: node.summary().chars().take(SUMMARY_WIDTH).collect(),
        };

        let (screen, lines) = match session.mode() {
            Mode::Help => {
                let lines: Vec<ViewLine> =
                    keymap::help_lines().into_iter().map(ViewLine::plain).collect();
                (Screen::Help, lines)
            }
            Mode::ChangedFiles => {
                let mut lines = vec![ViewLine::plain(format!(
                    "changed files of {}",
                    node.commit_id()
                ))];
                lines.extend(node.file_list().iter().map(|path| ViewLine::plain(path.as_str())));
                (Screen::ChangedFiles, lines)
            }
            _ => {
                let matcher = session.search().matcher();
                let lines: Vec<ViewLine> = node
                    .lines()
                    .map(|lines| {
                        (window.head_line..window.end_line())
                            .filter_map(|i| lines.get(i))
                            .map(|line| view_line(line, matcher))
                            .collect()
                    })
                    .unwrap_or_default();
                (Screen::Commit, lines)
            }
        };

        let message = Some(session.message())
            .filter(|message| !message.is_empty())
            .map(str::to_string);

        Self {
            screen,
            lines,
            status,
            message,
            cols: session.cols(),
            rows: session.rows(),
        }
    }
}

fn view_line(raw: &[u8], matcher: Option<&Matcher>) -> ViewLine {
    let text = expand_tabs(&raw.to_str_lossy());
    let highlights = matcher
        .map(|matcher| matcher.find_ranges(text.as_bytes()))
        .unwrap_or_default()
        .into_iter()
        .filter(|&(start, end)| text.is_char_boundary(start) && text.is_char_boundary(end))
        .collect();
    ViewLine {
        kind: LineKind::classify(raw),
        text,
        highlights,
    }
}

fn expand_tabs(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut expanded = String::with_capacity(text.len() + TAB_WIDTH);
    let mut column = 0;
    for c in text.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            expanded.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            expanded.push(c);
            column += 1;
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchKind;

    #[test]
    fn test_classify() {
        assert_eq!(LineKind::classify(b"+added"), LineKind::Added);
        assert_eq!(LineKind::classify(b"--- a/f"), LineKind::Removed);
        assert_eq!(LineKind::classify(b"@@ -1 +1 @@"), LineKind::Hunk);
        assert_eq!(LineKind::classify(b"commit 0123"), LineKind::CommitHeader);
        assert_eq!(LineKind::classify(b"context"), LineKind::Plain);
        assert_eq!(LineKind::classify(b""), LineKind::Plain);
    }

    #[test]
    fn test_status_format() {
        let status = StatusLine {
            percent: 42,
            shown: 21,
            total: 50,
            short_id: "0123abcd".to_string(),
            summary: "Fix frob".to_string(),
        };
        assert_eq!(status.format(), "42% (21/50)   0123abcd: Fix frob");
    }

    #[test]
    fn test_tabs_expand_to_stops() {
        assert_eq!(expand_tabs("+\tx"), "+       x");
        assert_eq!(expand_tabs("12345678\ty"), "12345678        y");
    }

    #[test]
    fn test_view_line_highlights() {
        let matcher = Matcher::compile(SearchKind::Regex, "frob").unwrap();
        let line = view_line(b"+Frob the frob", Some(&matcher));
        assert_eq!(line.kind, LineKind::Added);
        assert_eq!(line.highlights, vec![(1, 5), (10, 14)]);
        assert!(view_line(b"+frob", None).highlights.is_empty());
    }
}
