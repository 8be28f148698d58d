//! Commit Store: the lazily extended traversal chain.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Node 0 is HEAD and every node
//! framed out of the input stream is appended as the new tail (the oldest known
//! commit), so a larger id is always older. Links are set once, when the node
//! is appended, and never change afterwards.

use crate::cache::CacheManager;
use crate::commit::{CommitNode, NodeId};
use crate::error::{LoglessError, Result};
use crate::source::DetailSource;
use crate::stream::RecordReader;

/// Direction of travel along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the root (`prev`)
    Older,
    /// Toward HEAD (`next`)
    Newer,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Self::Older => Self::Newer,
            Self::Newer => Self::Older,
        }
    }
}

/// Outcome of a one-step move along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(NodeId),
    /// No neighbour exists in that direction
    EndOfChain,
    /// The current commit is the range bound in that direction
    RangeBound,
}

impl Advance {
    pub fn moved(self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// A commit together with its scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Place {
    pub node: NodeId,
    pub head_line: usize,
}

/// Optional range restriction set by marking two commits.
///
/// `begin` is the older bound and `end` the newer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeMarks {
    pub begin: Option<NodeId>,
    pub end: Option<NodeId>,
}

impl RangeMarks {
    pub fn is_set(&self) -> bool {
        self.begin.is_some() || self.end.is_some()
    }

    /// The bound that stops travel in `direction`.
    pub fn bound(&self, direction: Direction) -> Option<NodeId> {
        match direction {
            Direction::Older => self.begin,
            Direction::Newer => self.end,
        }
    }

    /// Keep `begin` older than `end` when both are set.
    fn normalize(&mut self) {
        if let (Some(begin), Some(end)) = (self.begin, self.end) {
            if begin < end {
                self.begin = Some(end);
                self.end = Some(begin);
            }
        }
    }
}

/// Which part of the range a mark operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    BeginSpecified,
    EndSpecified,
    Specified,
    Cleared,
}

impl RangeStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::BeginSpecified => "begin of range specified",
            Self::EndSpecified => "end of range specified",
            Self::Specified => "range specified",
            Self::Cleared => "range cleared",
        }
    }
}

/// The traversal chain, its input stream and the body cache.
pub struct CommitStore {
    nodes: Vec<CommitNode>,
    reader: Box<dyn RecordReader>,
    source: Box<dyn DetailSource>,
    cache: CacheManager,
    exhausted: bool,
    current: NodeId,
    range: RangeMarks,
}

impl CommitStore {
    /// Frame the first commit out of `reader`.
    ///
    /// A stream without a single record is [`LoglessError::EmptyLog`].
    pub fn open(
        mut reader: Box<dyn RecordReader>,
        source: Box<dyn DetailSource>,
        cache: CacheManager,
    ) -> Result<Self> {
        let first = reader.next_record()?.ok_or(LoglessError::EmptyLog)?;

        let mut store = Self {
            nodes: vec![CommitNode::new(first.commit_id)],
            reader,
            source,
            cache,
            exhausted: false,
            current: 0,
            range: RangeMarks::default(),
        };
        if let Some(text) = first.text {
            store.cache.admit_pinned(&mut store.nodes, 0, text)?;
        }
        log::info!("opened log at {}", store.nodes[0].commit_id());
        Ok(store)
    }

    /// Append one more commit to the tail if the stream has any.
    ///
    /// Returns whether a node was appended. Once the stream is exhausted this
    /// never reads again.
    pub fn ensure_next(&mut self) -> Result<bool> {
        let tail = self.tail();
        if self.exhausted || self.nodes[tail].prev.is_some() {
            return Ok(false);
        }

        let Some(record) = self.reader.next_record()? else {
            self.exhausted = true;
            log::info!("log stream exhausted after {} commits", self.nodes.len());
            return Ok(false);
        };

        let id = self.nodes.len();
        let mut node = CommitNode::new(record.commit_id);
        node.next = Some(tail);
        self.nodes.push(node);
        self.nodes[tail].prev = Some(id);

        if let Some(text) = record.text {
            self.cache.admit_pinned(&mut self.nodes, id, text)?;
        }
        Ok(true)
    }

    /// Neighbour of `from` in `direction`, extending the chain when needed.
    pub fn neighbor(&mut self, from: NodeId, direction: Direction) -> Result<Advance> {
        if self.range.bound(direction) == Some(from) {
            return Ok(Advance::RangeBound);
        }
        let link = match direction {
            Direction::Older => {
                if self.nodes[from].prev.is_none() && from == self.tail() {
                    self.ensure_next()?;
                }
                self.nodes[from].prev
            }
            Direction::Newer => self.nodes[from].next,
        };
        Ok(link.map_or(Advance::EndOfChain, Advance::Moved))
    }

    /// Move `current` one commit in `direction`; the new commit starts at line 0.
    pub fn advance(&mut self, direction: Direction) -> Result<Advance> {
        let step = self.neighbor(self.current, direction)?;
        if let Advance::Moved(id) = step {
            self.current = id;
            self.nodes[id].head_line = 0;
        }
        Ok(step)
    }

    /// Jump to the range end, or HEAD without a range.
    pub fn goto_head(&mut self) -> bool {
        let target = self.range.end.unwrap_or(0);
        self.jump(target)
    }

    /// Where a root visit can jump directly, if already known.
    pub fn known_root(&self) -> Option<NodeId> {
        self.range
            .begin
            .or_else(|| self.exhausted.then(|| self.tail()))
    }

    /// Make `id` current with its view reset to the top.
    pub fn jump(&mut self, id: NodeId) -> bool {
        if id == self.current {
            return false;
        }
        self.current = id;
        self.nodes[id].head_line = 0;
        true
    }

    pub fn place(&self) -> Place {
        Place {
            node: self.current,
            head_line: self.nodes[self.current].head_line,
        }
    }

    pub fn restore(&mut self, place: Place) {
        self.current = place.node;
        self.nodes[place.node].head_line = place.head_line;
    }

    pub fn mark_range_begin(&mut self) -> RangeStatus {
        self.range.begin = Some(self.current);
        self.range.normalize();
        if self.range.end.is_some() {
            RangeStatus::Specified
        } else {
            RangeStatus::BeginSpecified
        }
    }

    pub fn mark_range_end(&mut self) -> RangeStatus {
        self.range.end = Some(self.current);
        self.range.normalize();
        if self.range.begin.is_some() {
            RangeStatus::Specified
        } else {
            RangeStatus::EndSpecified
        }
    }

    pub fn clear_range(&mut self) -> RangeStatus {
        self.range = RangeMarks::default();
        RangeStatus::Cleared
    }

    pub fn range(&self) -> RangeMarks {
        self.range
    }

    /// Make `id` resident, fetching its body when purged.
    ///
    /// Commits framed with their own text are pinned and never fetched.
    pub fn materialize(&mut self, id: NodeId) -> Result<bool> {
        self.cache
            .materialize(&mut self.nodes, id, self.source.as_mut())
    }

    pub fn materialize_current(&mut self) -> Result<bool> {
        self.materialize(self.current)
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn current_node(&self) -> &CommitNode {
        &self.nodes[self.current]
    }

    pub fn current_node_mut(&mut self) -> &mut CommitNode {
        &mut self.nodes[self.current]
    }

    pub fn node(&self, id: NodeId) -> &CommitNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommitNode {
        &mut self.nodes[id]
    }

    /// Number of commits framed so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The oldest commit framed so far.
    pub fn tail(&self) -> NodeId {
        self.nodes.len() - 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }
}

/// Outcome of one root-walk step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStep {
    Continue,
    Done,
}

/// Long-running walk to the oldest commit, one appended node per step.
#[derive(Debug, Clone)]
pub struct RootWalk {
    origin: Place,
}

impl RootWalk {
    pub fn start(store: &CommitStore) -> Self {
        log::debug!("visiting root from {}", store.current_node().commit_id().short());
        Self {
            origin: store.place(),
        }
    }

    pub fn step(&mut self, store: &mut CommitStore) -> Result<WalkStep> {
        let appended = store.ensure_next()?;
        store.jump(store.tail());
        if appended {
            Ok(WalkStep::Continue)
        } else {
            Ok(WalkStep::Done)
        }
    }

    /// Abandon the walk and go back to where it started.
    pub fn cancel(self, store: &mut CommitStore) {
        store.restore(self.origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitId;
    use crate::source::StaticSource;
    use crate::stream::IdStreamReader;
    use std::io::Cursor;

    fn ids(count: usize) -> String {
        (0..count).map(|n| format!("{n:040x}\n")).collect()
    }

    fn store(count: usize) -> CommitStore {
        let mut source = StaticSource::new();
        for n in 0..count {
            let id = CommitId::parse(format!("{n:040x}").as_bytes()).unwrap();
            source.insert(id, format!("commit {n:040x}\n\n    message {n}\n"));
        }
        let reader = IdStreamReader::new(Cursor::new(ids(count).into_bytes()));
        CommitStore::open(Box::new(reader), Box::new(source), CacheManager::new(1 << 20)).unwrap()
    }

    #[test]
    fn test_open_empty_stream() {
        let reader = IdStreamReader::new(Cursor::new(Vec::new()));
        let result = CommitStore::open(
            Box::new(reader),
            Box::new(StaticSource::new()),
            CacheManager::default(),
        );
        assert!(matches!(result, Err(LoglessError::EmptyLog)));
    }

    #[test]
    fn test_ensure_next_is_idempotent_after_exhaustion() {
        let mut store = store(2);
        assert!(store.ensure_next().unwrap());
        assert!(!store.ensure_next().unwrap());
        assert!(store.is_exhausted());
        for _ in 0..5 {
            assert!(!store.ensure_next().unwrap());
        }
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_advance_links_and_ends() {
        let mut store = store(3);
        assert_eq!(store.advance(Direction::Newer).unwrap(), Advance::EndOfChain);
        assert_eq!(store.advance(Direction::Older).unwrap(), Advance::Moved(1));
        assert_eq!(store.advance(Direction::Older).unwrap(), Advance::Moved(2));
        assert_eq!(store.advance(Direction::Older).unwrap(), Advance::EndOfChain);
        assert_eq!(store.node(2).next(), Some(1));
        assert_eq!(store.node(1).prev(), Some(2));
        assert_eq!(store.advance(Direction::Newer).unwrap(), Advance::Moved(1));
    }

    #[test]
    fn test_range_blocks_navigation() {
        let mut store = store(5);
        store.advance(Direction::Older).unwrap();
        assert_eq!(store.mark_range_end(), RangeStatus::EndSpecified);
        store.advance(Direction::Older).unwrap();
        store.advance(Direction::Older).unwrap();
        assert_eq!(store.mark_range_begin(), RangeStatus::Specified);

        assert_eq!(store.advance(Direction::Older).unwrap(), Advance::RangeBound);
        assert!(store.goto_head());
        assert_eq!(store.current(), 1);
        assert_eq!(store.advance(Direction::Newer).unwrap(), Advance::RangeBound);
        assert_eq!(store.known_root(), Some(3));

        store.clear_range();
        assert_eq!(store.advance(Direction::Newer).unwrap(), Advance::Moved(0));
    }

    #[test]
    fn test_range_marks_are_normalized() {
        let mut store = store(3);
        store.advance(Direction::Older).unwrap();
        store.advance(Direction::Older).unwrap();
        store.mark_range_end();
        store.goto_head();
        store.mark_range_begin();
        assert_eq!(
            store.range(),
            RangeMarks {
                begin: Some(2),
                end: Some(0)
            }
        );
    }

    #[test]
    fn test_root_walk_and_cancel() {
        let mut store = store(4);
        store.current_node_mut().head_line = 0;
        let mut walk = RootWalk::start(&store);
        while walk.step(&mut store).unwrap() == WalkStep::Continue {}
        assert_eq!(store.current(), 3);
        assert_eq!(store.known_root(), Some(3));

        store.goto_head();
        let mut walk = RootWalk::start(&store);
        walk.step(&mut store).unwrap();
        walk.cancel(&mut store);
        assert_eq!(store.current(), 0);
    }

    #[test]
    fn test_materialize_current() {
        let mut store = store(1);
        assert!(store.materialize_current().unwrap());
        assert_eq!(store.current_node().summary(), "message 0");
        assert!(!store.materialize_current().unwrap());
    }
}
