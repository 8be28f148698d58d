//! Paginator over one commit's indexed lines.
//!
//! Scrolling clamps the head line to `[0, max(0, line_count - height)]`. A head
//! line placed further down by a search stays where it is until the user
//! scrolls up or jumps.

/// Scroll operations bound to keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOp {
    LineDown,
    LineUp,
    PageDown,
    PageUp,
    Top,
    Bottom,
}

/// Visible window over a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub head_line: usize,
    pub line_count: usize,
    pub height: usize,
}

impl PageWindow {
    pub fn new(head_line: usize, line_count: usize, height: usize) -> Self {
        Self {
            head_line,
            line_count,
            height,
        }
    }

    /// Largest head line that still fills the window.
    pub fn max_head(&self) -> usize {
        self.line_count.saturating_sub(self.height)
    }

    /// Move by `delta` lines; returns whether the view changed.
    pub fn scroll_lines(&mut self, delta: isize) -> bool {
        let before = self.head_line;
        if delta >= 0 {
            if self.head_line < self.max_head() {
                self.head_line = (self.head_line + delta.unsigned_abs()).min(self.max_head());
            }
        } else {
            self.head_line = self.head_line.saturating_sub(delta.unsigned_abs());
        }
        self.head_line != before
    }

    /// Move by `pages` windows.
    pub fn scroll_pages(&mut self, pages: isize) -> bool {
        self.scroll_lines(pages.saturating_mul(self.height.max(1) as isize))
    }

    pub fn top(&mut self) -> bool {
        let before = self.head_line;
        self.head_line = 0;
        self.head_line != before
    }

    pub fn bottom(&mut self) -> bool {
        let before = self.head_line;
        self.head_line = self.max_head();
        self.head_line != before
    }

    pub fn apply(&mut self, op: PageOp) -> bool {
        match op {
            PageOp::LineDown => self.scroll_lines(1),
            PageOp::LineUp => self.scroll_lines(-1),
            PageOp::PageDown => self.scroll_pages(1),
            PageOp::PageUp => self.scroll_pages(-1),
            PageOp::Top => self.top(),
            PageOp::Bottom => self.bottom(),
        }
    }

    /// Last visible line (exclusive), clamped to the commit.
    pub fn end_line(&self) -> usize {
        (self.head_line + self.height).min(self.line_count)
    }

    /// How far through the commit the bottom of the window is.
    pub fn percent(&self) -> usize {
        if self.line_count == 0 {
            return 100;
        }
        self.end_line() * 100 / self.line_count
    }
}
