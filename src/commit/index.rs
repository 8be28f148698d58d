//! Line indexer for materialized commit text.
//!
//! A commit body (the output of `git show` or one framed record of `git log`)
//! is split into line-start offsets with memchr, and the structured fields the
//! pager keeps across eviction are extracted in a single pass over those lines.

use crate::commit::CommitId;
use bstr::ByteSlice;
use memchr::memchr_iter;

/// Prefix of the identifying header line of every commit.
pub const COMMIT_HEADER: &[u8] = b"commit ";

/// Prefix of the post-image header of a changed file in a diff.
const FILE_HEADER: &[u8] = b"+++ b/";

/// Byte offsets where each line of a commit body starts.
///
/// - `offsets[0]` is always 0, so every body has at least one line
/// - a trailing newline does not open an extra empty line
/// - a final line without a newline is still counted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    offsets: Vec<usize>,
}

impl LineIndex {
    /// Index every line of `body`.
    pub fn build(body: &[u8]) -> Self {
        let mut offsets = Vec::with_capacity(body.len() / 40 + 1);
        offsets.push(0);

        for newline in memchr_iter(b'\n', body) {
            let next = newline + 1;
            if next < body.len() {
                offsets.push(next);
            }
        }

        Self { offsets }
    }

    /// Number of navigable lines.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Line-start offsets in order.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Byte range of line `index` without its newline.
    pub fn span(&self, body: &[u8], index: usize) -> Option<(usize, usize)> {
        let start = *self.offsets.get(index)?;
        let end = match self.offsets.get(index + 1) {
            Some(&next) => next - 1,
            None => {
                if body.last() == Some(&b'\n') {
                    body.len() - 1
                } else {
                    body.len()
                }
            }
        };
        Some((start, end.max(start)))
    }
}

/// Borrowed view over a resident body and its line index.
#[derive(Debug, Clone, Copy)]
pub struct CommitLines<'a> {
    body: &'a [u8],
    index: &'a LineIndex,
}

impl<'a> CommitLines<'a> {
    pub fn new(body: &'a [u8], index: &'a LineIndex) -> Self {
        Self { body, index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Line `index` without its trailing newline.
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.index
            .span(self.body, index)
            .map(|(start, end)| &self.body[start..end])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Fields parsed once from a commit body and retained across purges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetails {
    pub commit_id: Option<CommitId>,
    pub summary: String,
    pub file_list: Vec<String>,
    pub message_lines: Vec<String>,
}

/// Extract the commit id, summary, changed files and message block.
pub fn parse_details(lines: CommitLines<'_>) -> CommitDetails {
    let commit_id = lines
        .iter()
        .find(|line| line.starts_with(COMMIT_HEADER))
        .and_then(|line| CommitId::from_header(line).ok());

    CommitDetails {
        commit_id,
        summary: find_summary(lines),
        file_list: find_changed_files(lines),
        message_lines: find_message_block(lines),
    }
}

/// First line after the header block with visible content, trimmed.
fn find_summary(lines: CommitLines<'_>) -> String {
    lines
        .iter()
        .skip_while(|line| !is_blank(line))
        .find(|line| !is_blank(line))
        .map(|line| line.trim().to_str_lossy().into_owned())
        .unwrap_or_default()
}

fn find_changed_files(lines: CommitLines<'_>) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.len() > FILE_HEADER.len())
        .filter_map(|line| line.strip_prefix(FILE_HEADER))
        .map(|path| path.to_str_lossy().into_owned())
        .collect()
}

/// Scanner states for locating the indented message block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageScan {
    /// Looking for the first line that starts with a space
    SeekingBody,
    /// Inside the block, looking for the blank line that closes it
    InBody { begin: usize },
}

/// The contiguous indented block between the header and the diff.
///
/// A commit without such a block yields an empty sequence.
fn find_message_block(lines: CommitLines<'_>) -> Vec<String> {
    let mut state = MessageScan::SeekingBody;
    let mut range = None;

    for (i, line) in lines.iter().enumerate() {
        match state {
            MessageScan::SeekingBody => {
                if line.first() == Some(&b' ') {
                    state = MessageScan::InBody { begin: i };
                }
            }
            MessageScan::InBody { begin } => {
                if line.is_empty() {
                    range = Some((begin, i));
                    break;
                }
            }
        }
    }

    let (begin, end) = match (range, state) {
        (Some(range), _) => range,
        (None, MessageScan::InBody { begin }) => (begin, lines.len()),
        (None, MessageScan::SeekingBody) => return Vec::new(),
    };

    (begin..end)
        .filter_map(|i| lines.get(i))
        .map(|line| line.to_str_lossy().into_owned())
        .collect()
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| b.is_ascii_whitespace())
}
