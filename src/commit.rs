//! Commit nodes of the traversal chain.
//!
//! A node is created as soon as its id is framed out of the log stream. The
//! full body and its line index are resident only while the node is `Filled`;
//! the id, summary, changed-file list and message block survive a purge.

pub mod index;

pub use index::{parse_details, CommitDetails, CommitLines, LineIndex};

use crate::error::{LoglessError, Result};
use bstr::ByteSlice;
use std::fmt;

/// Length of a full hexadecimal object name.
pub const COMMIT_ID_LEN: usize = 40;

/// Arena index of a node inside the commit store.
pub type NodeId = usize;

/// 40-hex-char commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(String);

impl CommitId {
    /// Parse a bare 40-hex-char id.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() != COMMIT_ID_LEN || !raw.iter().all(u8::is_ascii_hexdigit) {
            return Err(LoglessError::malformed(format!(
                "expected a {}-hex-char commit id, got {:?}",
                COMMIT_ID_LEN,
                raw.as_bstr()
            )));
        }
        Ok(Self(raw.to_ascii_lowercase().to_str_lossy().into_owned()))
    }

    /// Parse the id out of a `commit <id>[ decorations]` header line.
    pub fn from_header(line: &[u8]) -> Result<Self> {
        let rest = line.strip_prefix(index::COMMIT_HEADER).ok_or_else(|| {
            LoglessError::malformed(format!(
                "record does not start with a commit header: {:?}",
                line.as_bstr()
            ))
        })?;
        let end = rest.len().min(COMMIT_ID_LEN);
        Self::parse(&rest[..end])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form shown in the status line.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a node's body and line index are currently resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Purged,
    Filled,
}

/// Body and line index of a `Filled` node.
#[derive(Debug)]
struct ResidentText {
    body: Vec<u8>,
    lines: LineIndex,
}

/// One commit in traversal order.
#[derive(Debug)]
pub struct CommitNode {
    commit_id: CommitId,
    summary: String,
    resident: Option<ResidentText>,
    body_size: Option<usize>,
    details_parsed: bool,
    file_list: Vec<String>,
    message_lines: Vec<String>,
    /// Scroll offset into the line index
    pub head_line: usize,
    /// Older neighbour (toward the root)
    pub(crate) prev: Option<NodeId>,
    /// Newer neighbour (toward HEAD)
    pub(crate) next: Option<NodeId>,
    pub(crate) in_size_order: bool,
    /// Text framed from the log stream itself; never evicted
    pub(crate) pinned: bool,
}

impl CommitNode {
    pub fn new(commit_id: CommitId) -> Self {
        Self {
            commit_id,
            summary: String::new(),
            resident: None,
            body_size: None,
            details_parsed: false,
            file_list: Vec::new(),
            message_lines: Vec::new(),
            head_line: 0,
            prev: None,
            next: None,
            in_size_order: false,
            pinned: false,
        }
    }

    pub fn commit_id(&self) -> &CommitId {
        &self.commit_id
    }

    /// Subject line; empty until the node was first materialized.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn cache_state(&self) -> CacheState {
        if self.resident.is_some() {
            CacheState::Filled
        } else {
            CacheState::Purged
        }
    }

    pub fn is_filled(&self) -> bool {
        self.resident.is_some()
    }

    /// Size of the body in bytes, known after the first materialization.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn body_size(&self) -> Option<usize> {
        self.body_size
    }

    pub fn file_list(&self) -> &[String] {
        &self.file_list
    }

    pub fn message_lines(&self) -> &[String] {
        &self.message_lines
    }

    pub fn details_parsed(&self) -> bool {
        self.details_parsed
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Resident lines, or `None` while purged.
    pub fn lines(&self) -> Option<CommitLines<'_>> {
        self.resident
            .as_ref()
            .map(|text| CommitLines::new(&text.body, &text.lines))
    }

    pub fn line_count(&self) -> Option<usize> {
        self.resident.as_ref().map(|text| text.lines.len())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.resident.as_ref().map(|text| text.body.as_slice())
    }

    /// Install a body and its index; first fill also records the parsed details.
    pub(crate) fn fill(&mut self, body: Vec<u8>, lines: LineIndex, details: Option<CommitDetails>) {
        self.body_size = Some(body.len());
        if let Some(details) = details {
            self.summary = details.summary;
            self.file_list = details.file_list;
            self.message_lines = details.message_lines;
            self.details_parsed = true;
        }
        self.resident = Some(ResidentText { body, lines });
        let count = self.line_count().unwrap_or(1);
        if self.head_line >= count {
            self.head_line = count - 1;
        }
    }

    /// Drop the body and line index, returning the number of bytes released.
    pub(crate) fn purge(&mut self) -> usize {
        self.resident.take().map_or(0, |text| text.body.len())
    }
}
