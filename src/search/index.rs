//! Full-text index over commit messages.
//!
//! The pager only needs two things from an index: insert a commit's message
//! once, and answer whether a set of query terms matches a commit.

use crate::commit::CommitId;
use std::collections::{HashMap, HashSet};

pub trait FullTextIndex {
    /// Index `message_lines` under `commit_id`; a second insert is a no-op.
    fn insert(&mut self, commit_id: &CommitId, message_lines: &[String]);

    fn contains(&self, commit_id: &CommitId) -> bool;

    /// Whether every term occurs among the commit's message tokens.
    fn matches(&self, commit_id: &CommitId, terms: &[String]) -> bool;
}

/// Token sets per commit, held in memory for the life of the session.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: HashMap<CommitId, HashSet<String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn tokenize(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

impl FullTextIndex for MemoryIndex {
    fn insert(&mut self, commit_id: &CommitId, message_lines: &[String]) {
        if self.documents.contains_key(commit_id) {
            return;
        }
        let tokens = message_lines
            .iter()
            .flat_map(|line| tokenize(line))
            .collect();
        self.documents.insert(commit_id.clone(), tokens);
    }

    fn contains(&self, commit_id: &CommitId) -> bool {
        self.documents.contains_key(commit_id)
    }

    fn matches(&self, commit_id: &CommitId, terms: &[String]) -> bool {
        if terms.is_empty() {
            return false;
        }
        self.documents.get(commit_id).is_some_and(|tokens| {
            terms
                .iter()
                .all(|term| tokens.contains(term.to_lowercase().as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(c: u8) -> CommitId {
        CommitId::parse(&[c; 40]).unwrap()
    }

    fn terms(query: &str) -> Vec<String> {
        query.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_all_terms_must_match() {
        let mut index = MemoryIndex::new();
        index.insert(&id(b'a'), &["    Fix the frobnicator.".to_string()]);

        assert!(index.matches(&id(b'a'), &terms("fix")));
        assert!(index.matches(&id(b'a'), &terms("FROBNICATOR fix")));
        assert!(!index.matches(&id(b'a'), &terms("fix widget")));
        assert!(!index.matches(&id(b'a'), &[]));
        assert!(!index.matches(&id(b'b'), &terms("fix")));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = MemoryIndex::new();
        index.insert(&id(b'a'), &["first".to_string()]);
        index.insert(&id(b'a'), &["second".to_string()]);

        assert_eq!(index.len(), 1);
        assert!(index.contains(&id(b'a')));
        assert!(index.matches(&id(b'a'), &terms("first")));
        assert!(!index.matches(&id(b'a'), &terms("second")));
    }
}
