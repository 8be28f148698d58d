//! Renderer trait
//!
//! The event loop draws through [`UIRenderer`], so the terminal backend can be
//! swapped for a recording mock in tests.

use crate::error::Result;
use crate::render::view::ViewState;

/// Core trait for drawing pager screens
pub trait UIRenderer {
    /// Draw one frame: the content lines, the status line and, when present,
    /// the message line below it.
    fn render(&mut self, view_state: &ViewState) -> Result<()>;

    /// Enter raw mode and the alternate screen.
    fn initialize(&mut self) -> Result<()>;

    /// Restore the terminal. Safe to call more than once.
    fn cleanup(&mut self) -> Result<()>;

    /// Current terminal dimensions as (cols, rows)
    fn get_terminal_size(&self) -> Result<(u16, u16)>;
}

/// Renderer that records frames instead of drawing them
#[derive(Debug, Clone)]
pub struct MockUIRenderer {
    pub render_count: usize,
    pub terminal_size: (u16, u16),
    pub is_initialized: bool,
    pub last_frame: Option<ViewState>,
}

impl Default for MockUIRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUIRenderer {
    pub fn new() -> Self {
        Self {
            render_count: 0,
            terminal_size: (80, 24),
            is_initialized: false,
            last_frame: None,
        }
    }

    pub fn set_terminal_size(&mut self, cols: u16, rows: u16) {
        self.terminal_size = (cols, rows);
    }

    /// Status line of the most recent frame.
    pub fn last_status(&self) -> Option<String> {
        self.last_frame.as_ref().map(|frame| frame.status.format())
    }
}

impl UIRenderer for MockUIRenderer {
    fn render(&mut self, view_state: &ViewState) -> Result<()> {
        self.render_count += 1;
        self.last_frame = Some(view_state.clone());
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        self.is_initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.is_initialized = false;
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        Ok(self.terminal_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::view::{Screen, StatusLine};

    fn frame() -> ViewState {
        ViewState {
            screen: Screen::Commit,
            lines: Vec::new(),
            status: StatusLine {
                percent: 100,
                shown: 0,
                total: 0,
                short_id: "0123abcd".to_string(),
                summary: String::new(),
            },
            message: None,
            cols: 80,
            rows: 24,
        }
    }

    #[test]
    fn test_mock_renderer_lifecycle() {
        let mut renderer = MockUIRenderer::new();
        assert!(!renderer.is_initialized);
        renderer.initialize().unwrap();
        assert!(renderer.is_initialized);

        renderer.render(&frame()).unwrap();
        assert_eq!(renderer.render_count, 1);
        assert_eq!(renderer.last_status().as_deref(), Some("100% (0/0)   0123abcd: "));

        renderer.cleanup().unwrap();
        assert!(!renderer.is_initialized);
    }

    #[test]
    fn test_mock_renderer_resize() {
        let mut renderer = MockUIRenderer::new();
        renderer.set_terminal_size(120, 30);
        assert_eq!(renderer.get_terminal_size().unwrap(), (120, 30));
    }
}
