//! Terminal renderer using ratatui
//!
//! Draws a [`ViewState`]: the content area, the status line and the optional
//! message line at the bottom.

use crate::error::Result;
use crate::render::renderer::UIRenderer;
use crate::render::theme::ColorTheme;
use crate::render::view::{ViewLine, ViewState};
use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

pub struct TerminalUI {
    terminal: Option<CrosstermTerminal>,
    theme: ColorTheme,
}

impl TerminalUI {
    pub fn new() -> Self {
        Self::with_theme(ColorTheme::default())
    }

    pub fn with_theme(theme: ColorTheme) -> Self {
        Self {
            terminal: None,
            theme,
        }
    }

    pub fn theme(&self) -> &ColorTheme {
        &self.theme
    }

    fn render_content(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let lines: Vec<Line> = view_state
            .lines
            .iter()
            .map(|line| styled_line(line, theme))
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_status(frame: &mut Frame, area: Rect, view_state: &ViewState, theme: &ColorTheme) {
        let status = Paragraph::new(view_state.status.format()).style(theme.status_style());
        frame.render_widget(status, area);
    }

    fn render_message(frame: &mut Frame, area: Rect, message: &str, theme: &ColorTheme) {
        frame.render_widget(Paragraph::new(message).style(theme.message), area);
    }
}

impl Default for TerminalUI {
    fn default() -> Self {
        Self::new()
    }
}

/// Diff-colored line with search matches overlaid.
pub fn styled_line<'a>(line: &'a ViewLine, theme: &ColorTheme) -> Line<'a> {
    let base = theme.line_style(line.kind);
    let text = line.text.as_str();
    if line.highlights.is_empty() {
        return Line::styled(text, base);
    }

    let highlight = base.patch(theme.search_match);
    let mut spans = Vec::new();
    let mut last_end = 0;
    for &(start, end) in &line.highlights {
        if start < last_end || end > text.len() {
            continue;
        }
        if start > last_end {
            spans.push(Span::styled(&text[last_end..start], base));
        }
        spans.push(Span::styled(&text[start..end], highlight));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(&text[last_end..], base));
    }
    Line::from(spans)
}

impl UIRenderer for TerminalUI {
    fn render(&mut self, view_state: &ViewState) -> Result<()> {
        if let Some(ref mut terminal) = self.terminal {
            let theme = &self.theme;

            terminal.draw(move |frame| {
                let message_rows = u16::from(view_state.message.is_some());
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints(
                        [
                            Constraint::Min(0),
                            Constraint::Length(1),
                            Constraint::Length(message_rows),
                        ]
                        .as_ref(),
                    )
                    .split(frame.size());

                Self::render_content(frame, chunks[0], view_state, theme);
                Self::render_status(frame, chunks[1], view_state, theme);
                if let Some(message) = view_state.message.as_deref() {
                    Self::render_message(frame, chunks[2], message, theme);
                }
            })?;
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend)?);
        Ok(())
    }

    /// Safe to call more than once; only the first call after `initialize`
    /// touches the terminal.
    fn cleanup(&mut self) -> Result<()> {
        if self.terminal.take().is_some() {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
        }
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        Ok(ratatui::crossterm::terminal::size()?)
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
