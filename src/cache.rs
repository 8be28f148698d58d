//! Bounded cache of materialized commit bodies.
//!
//! Total resident body bytes never exceed the configured limit. When a new body
//! would breach it, resident commits are purged smallest first (not least
//! recently used) until the new body fits. Large bodies are the expensive ones
//! to refetch, so they stay resident longest.
//!
//! Every node that was ever fetched sits in `size_order` exactly once, whether
//! or not it is resident right now. Record text framed out of a full log stream
//! is pinned instead: it counts against the limit but is never evicted, since
//! no source can hand the same text back.

use crate::commit::{parse_details, CommitLines, CommitNode, LineIndex, NodeId};
use crate::error::{LoglessError, Result};
use crate::source::DetailSource;

/// Default resident byte budget (1 GiB).
pub const DEFAULT_CACHE_LIMIT: usize = 1 << 30;

/// Size-ordered eviction over an arena of commit nodes.
#[derive(Debug, Clone)]
pub struct CacheManager {
    limit: usize,
    resident: usize,
    /// `(body size, node)` ascending by size, then by node id
    size_order: Vec<(usize, NodeId)>,
}

impl CacheManager {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            resident: 0,
            size_order: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently held by `Filled` nodes.
    pub fn resident_bytes(&self) -> usize {
        self.resident
    }

    /// Number of nodes that were materialized at least once.
    pub fn tracked(&self) -> usize {
        self.size_order.len()
    }

    /// Make `id` resident, fetching its body from `source` when purged.
    ///
    /// Returns `true` when a fetch happened.
    pub fn materialize(
        &mut self,
        nodes: &mut [CommitNode],
        id: NodeId,
        source: &mut dyn DetailSource,
    ) -> Result<bool> {
        if nodes[id].is_filled() {
            return Ok(false);
        }
        let body = source.fetch(nodes[id].commit_id())?;
        self.admit(nodes, id, body)?;
        Ok(true)
    }

    /// Install an already available body for `id`, evicting as needed.
    pub fn admit(&mut self, nodes: &mut [CommitNode], id: NodeId, body: Vec<u8>) -> Result<()> {
        self.install(nodes, id, body, false)
    }

    /// Install record text framed from the log stream; it stays resident.
    pub fn admit_pinned(
        &mut self,
        nodes: &mut [CommitNode],
        id: NodeId,
        body: Vec<u8>,
    ) -> Result<()> {
        self.install(nodes, id, body, true)
    }

    fn install(
        &mut self,
        nodes: &mut [CommitNode],
        id: NodeId,
        body: Vec<u8>,
        pinned: bool,
    ) -> Result<()> {
        if nodes[id].is_filled() {
            return Ok(());
        }

        let size = body.len();
        self.make_room(nodes, size, id)?;

        let index = LineIndex::build(&body);
        let details = if nodes[id].details_parsed() {
            None
        } else {
            Some(parse_details(CommitLines::new(&body, &index)))
        };
        if let Some(parsed_id) = details.as_ref().and_then(|d| d.commit_id.as_ref()) {
            if parsed_id != nodes[id].commit_id() {
                log::warn!(
                    "body of {} announces commit {}",
                    nodes[id].commit_id().short(),
                    parsed_id.short()
                );
            }
        }

        nodes[id].fill(body, index, details);
        self.resident += size;
        if pinned {
            nodes[id].pinned = true;
        } else {
            self.register(nodes, id, size);
        }

        log::debug!(
            "materialized {} ({} bytes, {} / {} resident)",
            nodes[id].commit_id().short(),
            size,
            self.resident,
            self.limit
        );
        Ok(())
    }

    /// Drop `id`'s body and line index; returns the bytes released.
    ///
    /// Pinned nodes are left alone.
    pub fn purge(&mut self, nodes: &mut [CommitNode], id: NodeId) -> usize {
        if nodes[id].is_pinned() {
            return 0;
        }
        let freed = nodes[id].purge();
        self.resident -= freed;
        freed
    }

    /// Purge smallest resident bodies until `requested` more bytes fit.
    fn make_room(&mut self, nodes: &mut [CommitNode], requested: usize, keep: NodeId) -> Result<()> {
        if self.resident + requested <= self.limit {
            return Ok(());
        }

        let mut evicted = 0;
        for i in 0..self.size_order.len() {
            if self.resident + requested <= self.limit {
                break;
            }
            let (_, victim) = self.size_order[i];
            if victim == keep || !nodes[victim].is_filled() {
                continue;
            }
            self.purge(nodes, victim);
            evicted += 1;
        }

        if self.resident + requested > self.limit {
            return Err(LoglessError::CacheExhausted {
                requested,
                limit: self.limit,
            });
        }

        log::debug!("evicted {evicted} commits to admit {requested} bytes");
        Ok(())
    }

    fn register(&mut self, nodes: &mut [CommitNode], id: NodeId, size: usize) {
        if nodes[id].in_size_order {
            return;
        }
        let key = (size, id);
        let pos = self.size_order.partition_point(|entry| *entry < key);
        self.size_order.insert(pos, key);
        nodes[id].in_size_order = true;
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{CacheState, CommitId};
    use crate::source::StaticSource;
    use proptest::prelude::*;

    fn commit_id(n: usize) -> CommitId {
        CommitId::parse(format!("{n:040x}").as_bytes()).unwrap()
    }

    /// Nodes whose bodies are `sizes[i]` bytes long.
    fn fixture(sizes: &[usize]) -> (Vec<CommitNode>, StaticSource) {
        let mut nodes = Vec::new();
        let mut source = StaticSource::new();
        for (i, &size) in sizes.iter().enumerate() {
            nodes.push(CommitNode::new(commit_id(i)));
            source.insert(commit_id(i), vec![b'x'; size]);
        }
        (nodes, source)
    }

    #[test]
    fn test_materialize_is_noop_when_filled() {
        let (mut nodes, mut source) = fixture(&[20]);
        let mut cache = CacheManager::new(100);

        assert!(cache.materialize(&mut nodes, 0, &mut source).unwrap());
        assert!(!cache.materialize(&mut nodes, 0, &mut source).unwrap());
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.resident_bytes(), 20);
    }

    #[test]
    fn test_evicts_smallest_first() {
        let (mut nodes, mut source) = fixture(&[10, 50, 30, 5]);
        let mut cache = CacheManager::new(90);

        for id in 0..3 {
            cache.materialize(&mut nodes, id, &mut source).unwrap();
        }
        assert_eq!(cache.resident_bytes(), 90);

        cache.materialize(&mut nodes, 3, &mut source).unwrap();
        assert_eq!(nodes[0].cache_state(), CacheState::Purged);
        assert_eq!(nodes[1].cache_state(), CacheState::Filled);
        assert_eq!(nodes[2].cache_state(), CacheState::Filled);
        assert_eq!(cache.resident_bytes(), 85);
    }

    #[test]
    fn test_cap_smaller_than_body_is_fatal() {
        let (mut nodes, mut source) = fixture(&[64]);
        let mut cache = CacheManager::new(32);

        let err = cache.materialize(&mut nodes, 0, &mut source).unwrap_err();
        assert!(matches!(
            err,
            LoglessError::CacheExhausted {
                requested: 64,
                limit: 32
            }
        ));
        assert!(err.is_fatal());
        assert_eq!(nodes[0].cache_state(), CacheState::Purged);
        assert_eq!(cache.resident_bytes(), 0);
    }

    #[test]
    fn test_rematerialize_keeps_single_registration() {
        let (mut nodes, mut source) = fixture(&[40, 40]);
        let mut cache = CacheManager::new(50);

        cache.materialize(&mut nodes, 0, &mut source).unwrap();
        cache.materialize(&mut nodes, 1, &mut source).unwrap();
        cache.materialize(&mut nodes, 0, &mut source).unwrap();

        assert_eq!(cache.tracked(), 2);
        assert!(nodes[0].is_filled());
        assert!(!nodes[1].is_filled());
    }

    #[test]
    fn test_line_index_stable_across_purge() {
        let mut nodes = vec![CommitNode::new(commit_id(0))];
        let mut source = StaticSource::new();
        source.insert(commit_id(0), "commit x\n\n    msg\n\n+a\n-b");
        let mut cache = CacheManager::new(1024);

        cache.materialize(&mut nodes, 0, &mut source).unwrap();
        let before: Vec<Vec<u8>> = nodes[0].lines().unwrap().iter().map(<[u8]>::to_vec).collect();

        cache.purge(&mut nodes, 0);
        assert_eq!(cache.resident_bytes(), 0);
        assert_eq!(nodes[0].summary(), "msg");

        cache.materialize(&mut nodes, 0, &mut source).unwrap();
        let after: Vec<Vec<u8>> = nodes[0].lines().unwrap().iter().map(<[u8]>::to_vec).collect();
        assert_eq!(before, after);
        assert_eq!(nodes[0].line_count(), Some(6));
    }

    #[test]
    fn test_pinned_text_is_never_evicted() {
        let (mut nodes, mut source) = fixture(&[0, 40, 40]);
        let mut cache = CacheManager::new(100);

        cache.admit_pinned(&mut nodes, 0, vec![b'r'; 50]).unwrap();
        assert!(nodes[0].is_pinned());
        assert_eq!(cache.purge(&mut nodes, 0), 0);
        assert!(nodes[0].is_filled());

        cache.materialize(&mut nodes, 1, &mut source).unwrap();
        cache.materialize(&mut nodes, 2, &mut source).unwrap();
        assert!(nodes[0].is_filled());
        assert!(!nodes[1].is_filled());
        assert_eq!(cache.resident_bytes(), 90);
        assert_eq!(cache.tracked(), 2);
    }

    #[test]
    fn test_pinned_text_counts_against_limit() {
        let mut nodes = vec![CommitNode::new(commit_id(0)), CommitNode::new(commit_id(1))];
        let mut cache = CacheManager::new(100);

        cache.admit_pinned(&mut nodes, 0, vec![b'r'; 60]).unwrap();
        let err = cache.admit_pinned(&mut nodes, 1, vec![b'r'; 60]).unwrap_err();
        assert!(matches!(err, LoglessError::CacheExhausted { requested: 60, limit: 100 }));
        assert!(nodes[0].is_filled());
    }

    proptest! {
        #[test]
        fn prop_resident_never_exceeds_limit(
            sizes in prop::collection::vec(1usize..200, 1..40),
            order in prop::collection::vec(any::<prop::sample::Index>(), 1..80),
        ) {
            let limit = 256;
            let (mut nodes, mut source) = fixture(&sizes);
            let mut cache = CacheManager::new(limit);

            for pick in order {
                let id = pick.index(sizes.len());
                cache.materialize(&mut nodes, id, &mut source).unwrap();

                let filled: usize = nodes
                    .iter()
                    .filter(|node| node.is_filled())
                    .filter_map(CommitNode::body_size)
                    .sum();
                prop_assert!(cache.resident_bytes() <= limit);
                prop_assert_eq!(cache.resident_bytes(), filled);
                prop_assert!(nodes[id].is_filled());
            }
        }
    }
}
