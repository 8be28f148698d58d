//! Rendering: session snapshots and the terminal that draws them.
//!
//! - [`view`]: [`ViewState`] built from the session after every redraw-worthy event
//! - [`renderer`]: the [`UIRenderer`] seam and a recording mock
//! - [`terminal`]: the ratatui implementation
//! - [`theme`]: diff colors and match highlighting

pub mod renderer;
pub mod terminal;
pub mod theme;
pub mod view;

pub use renderer::{MockUIRenderer, UIRenderer};
pub use terminal::TerminalUI;
pub use theme::ColorTheme;
pub use view::{LineKind, Screen, StatusLine, ViewLine, ViewState};
