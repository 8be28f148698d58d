//! Color theme for commit text, match highlighting and the status line.

use crate::render::view::LineKind;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// `commit <id>` header lines
    pub commit_header: Style,

    /// Lines starting with `+`
    pub added: Style,

    /// Lines starting with `-`
    pub removed: Style,

    /// Hunk headers starting with `@`
    pub hunk: Style,

    /// Search match highlighting
    pub search_match: Style,

    pub status_bg: Color,
    pub status_fg: Color,

    /// Message line below the status line
    pub message: Style,
}

impl Default for ColorTheme {
    /// Colors of `git log -p --color`
    fn default() -> Self {
        Self {
            commit_header: Style::default().fg(Color::Yellow),
            added: Style::default().fg(Color::Green),
            removed: Style::default().fg(Color::Red),
            hunk: Style::default().fg(Color::Cyan),
            search_match: Style::default().add_modifier(Modifier::REVERSED),
            status_bg: Color::Reset,
            status_fg: Color::Reset,
            message: Style::default(),
        }
    }
}

impl ColorTheme {
    /// No colors; matches are still shown in reverse video
    pub fn monochrome() -> Self {
        Self {
            commit_header: Style::default(),
            added: Style::default(),
            removed: Style::default(),
            hunk: Style::default(),
            search_match: Style::default().add_modifier(Modifier::REVERSED),
            status_bg: Color::Reset,
            status_fg: Color::Reset,
            message: Style::default(),
        }
    }

    pub fn line_style(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::CommitHeader => self.commit_header,
            LineKind::Added => self.added,
            LineKind::Removed => self.removed,
            LineKind::Hunk => self.hunk,
            LineKind::Plain => Style::default(),
        }
    }

    pub fn status_style(&self) -> Style {
        Style::default()
            .bg(self.status_bg)
            .fg(self.status_fg)
            .add_modifier(Modifier::REVERSED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monochrome_has_no_colors() {
        let theme = ColorTheme::monochrome();
        assert_eq!(theme.line_style(LineKind::Added), Style::default());
        assert!(theme.search_match.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_diff_colors() {
        let theme = ColorTheme::default();
        assert_eq!(theme.line_style(LineKind::Removed).fg, Some(Color::Red));
        assert_eq!(theme.line_style(LineKind::Hunk).fg, Some(Color::Cyan));
    }
}
