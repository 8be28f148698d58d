//! Resumable global search.
//!
//! A global search first tries the current commit synchronously. If that
//! misses it moves one commit in the search direction and hands back a
//! [`GlobalSearch`] whose `step` tries exactly one commit per call, so the
//! event loop can keep reading input and honour cancellation between steps.

use crate::commit::NodeId;
use crate::error::Result;
use crate::search::index::FullTextIndex;
use crate::search::matcher::{match_commit, SearchKind};
use crate::search::state::SearchState;
use crate::search::SearchDirection;
use crate::store::{Advance, CommitStore, Place};

/// Result of starting a search.
#[derive(Debug)]
pub enum SearchOutcome {
    Found,
    NotFound,
    /// The walk continues over later ticks
    Running(GlobalSearch),
}

/// Result of one search step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Found,
    Continue,
    /// Chain or range exhausted; the original place is restored
    NotFound,
}

/// Try to match inside one commit, materializing it first.
///
/// On a regex hit the commit's `head_line` moves to the matching line; on a
/// full-text hit it resets to 0.
pub fn match_node(
    store: &mut CommitStore,
    node: NodeId,
    direction: SearchDirection,
    progressive: bool,
    search: &SearchState,
    index: &mut dyn FullTextIndex,
) -> Result<bool> {
    let Some(matcher) = search.matcher() else {
        return Ok(false);
    };
    store.materialize(node)?;

    match search.kind() {
        SearchKind::FullText => {
            // The cursor commit already matched on the previous hit
            if progressive {
                return Ok(false);
            }
            let commit = store.node(node);
            if !index.contains(commit.commit_id()) {
                index.insert(commit.commit_id(), commit.message_lines());
            }
            let terms = matcher.terms().unwrap_or_default();
            if !index.matches(commit.commit_id(), terms) {
                return Ok(false);
            }
            store.node_mut(node).head_line = 0;
            Ok(true)
        }
        SearchKind::Regex => {
            let commit = store.node(node);
            let Some(lines) = commit.lines() else {
                return Ok(false);
            };
            let found = match_commit(
                lines,
                commit.head_line,
                direction,
                progressive,
                search.filter(),
                matcher,
            );
            match found {
                Some(line) => {
                    store.node_mut(node).head_line = line;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}

/// An in-flight global search.
#[derive(Debug, Clone)]
pub struct GlobalSearch {
    direction: SearchDirection,
    origin: Place,
    visited: usize,
}

impl GlobalSearch {
    /// Search the current commit, then set up a walk if `global` allows it.
    pub fn start(
        store: &mut CommitStore,
        direction: SearchDirection,
        global: bool,
        progressive: bool,
        search: &SearchState,
        index: &mut dyn FullTextIndex,
    ) -> Result<SearchOutcome> {
        let current = store.current();
        if match_node(store, current, direction, progressive, search, index)? {
            return Ok(SearchOutcome::Found);
        }
        if !global {
            return Ok(SearchOutcome::NotFound);
        }

        let origin = store.place();
        if !enter_neighbor(store, direction)? {
            return Ok(SearchOutcome::NotFound);
        }

        log::debug!(
            "global {:?} search continues from {}",
            direction,
            store.current_node().commit_id().short()
        );
        Ok(SearchOutcome::Running(Self {
            direction,
            origin,
            visited: 1,
        }))
    }

    /// Try the current commit, or move one commit further.
    pub fn step(
        &mut self,
        store: &mut CommitStore,
        search: &SearchState,
        index: &mut dyn FullTextIndex,
    ) -> Result<StepResult> {
        let current = store.current();
        if match_node(store, current, self.direction, false, search, index)? {
            log::debug!("search matched after {} commits", self.visited);
            return Ok(StepResult::Found);
        }

        if enter_neighbor(store, self.direction)? {
            self.visited += 1;
            return Ok(StepResult::Continue);
        }

        log::debug!("search exhausted after {} commits", self.visited);
        store.restore(self.origin);
        Ok(StepResult::NotFound)
    }

    /// Abandon the walk and put the cursor back where the search began.
    pub fn cancel(self, store: &mut CommitStore) {
        store.restore(self.origin);
    }

    pub fn origin(&self) -> Place {
        self.origin
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }
}

/// Move to the next commit in `direction` and park its cursor at the scan start.
fn enter_neighbor(store: &mut CommitStore, direction: SearchDirection) -> Result<bool> {
    let Advance::Moved(next) = store.advance(direction.chain())? else {
        return Ok(false);
    };
    if direction == SearchDirection::Backward {
        store.materialize(next)?;
        let last = store.node(next).line_count().unwrap_or(1).saturating_sub(1);
        store.node_mut(next).head_line = last;
    }
    Ok(true)
}
