//! # logless - Commit-by-Commit Git Log Pager
//!
//! A terminal pager that shows a `git log` one commit at a time, loading the
//! history lazily and fetching each commit's full text on demand.
//!
//! ## Features
//!
//! - **Incremental loading**: commits are framed from the log stream only as
//!   navigation or search reaches them
//! - **Bounded memory**: commit bodies are evicted smallest-first once a byte
//!   limit is reached and refetched when revisited
//! - **Resumable search**: case-insensitive regex and full-text searches that
//!   walk the history one commit per event-loop tick and can be cancelled
//! - **Range marks**: restrict navigation and search to a slice of history
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`config`] - Defaults, config file and command-line overrides
//! - [`commit`] / [`stream`] / [`source`] - commit nodes, record framing and detail fetching
//! - [`cache`] / [`store`] - eviction and the traversal chain
//! - [`pager`] / [`search`] - per-commit paging and search
//! - [`session`] - keystroke dispatch over all interactive state
//! - [`input`] / [`render`] / [`app`] - terminal I/O and the event loop

// Core modules
pub mod cache;
pub mod commit;
pub mod config;
pub mod error;
pub mod source;
pub mod store;
pub mod stream;

// Interaction
pub mod pager;
pub mod search;
pub mod session;

// Terminal subsystems
pub mod app;
pub mod input;
pub mod render;

// Re-export commonly used types for convenience
pub use error::{LoglessError, Result};

// Public API surface for external usage
pub use app::Application;
pub use cache::CacheManager;
pub use commit::{CommitId, CommitNode, NodeId};
pub use config::{ConfigOverrides, PagerConfig};
pub use session::{Effect, Mode, Session};
pub use store::CommitStore;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
