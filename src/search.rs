//! Search engine.
//!
//! - [`state`]: query editing, phases and the compiled matcher
//! - [`matcher`]: regex / full-text matchers, line filters and the per-commit scan
//! - [`task`]: the resumable global search walked one commit per tick
//! - [`index`]: full-text index over commit messages
//!
//! A forward search scans toward higher line numbers and older commits; a
//! backward search scans toward lower line numbers and newer commits.

pub mod index;
pub mod matcher;
pub mod state;
pub mod task;

pub use index::{FullTextIndex, MemoryIndex};
pub use matcher::{match_commit, LineFilter, Matcher, SearchKind};
pub use state::{QueryInput, SearchPhase, SearchState, DEFAULT_QUERY_LIMIT};
pub use task::{match_node, GlobalSearch, SearchOutcome, StepResult};

use crate::store::Direction;

/// Search direction within and across commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    /// Direction of travel along the commit chain.
    pub fn chain(self) -> Direction {
        match self {
            Self::Forward => Direction::Older,
            Self::Backward => Direction::Newer,
        }
    }
}
