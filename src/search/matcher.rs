//! Compiled query matchers and the per-commit line scan.

use crate::commit::CommitLines;
use crate::error::{LoglessError, Result};
use crate::search::SearchDirection;
use bstr::ByteSlice;
use grep_matcher::Matcher as _;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};

/// How a query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Case-insensitive regular expression, unanchored, per line
    Regex,
    /// Whitespace-separated terms looked up in the full-text index
    FullText,
}

impl SearchKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::FullText => "FTS",
        }
    }
}

/// Restricts which lines a regex search may stop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFilter {
    #[default]
    Default,
    /// Added or removed diff lines
    Modified,
    /// `@@` hunk markers
    At,
    /// `+++` / `---` file headers
    File,
    /// Indented message lines ahead of the diff
    CommitMessage,
}

impl LineFilter {
    /// Filter selected by a keystroke at the filter prompt.
    pub fn from_key(key: u8) -> Option<Self> {
        match key {
            b'm' => Some(Self::Modified),
            b'a' => Some(Self::At),
            b'f' => Some(Self::File),
            b'l' => Some(Self::CommitMessage),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Modified => "modified",
            Self::At => "at",
            Self::File => "file",
            Self::CommitMessage => "commit",
        }
    }

    pub fn accepts(self, line: &[u8]) -> bool {
        match self {
            Self::Default => true,
            Self::Modified => matches!(line.first(), Some(b'+') | Some(b'-')),
            Self::At => line.first() == Some(&b'@'),
            Self::File => line.starts_with(b"+++") || line.starts_with(b"---"),
            Self::CommitMessage => line.starts_with(b"    "),
        }
    }
}

/// A compiled query.
#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(RegexMatcher),
    /// Lowercased query terms
    Terms(Vec<String>),
}

impl Matcher {
    pub fn compile(kind: SearchKind, query: &str) -> Result<Self> {
        match kind {
            SearchKind::Regex => RegexMatcherBuilder::new()
                .case_insensitive(true)
                .build(query)
                .map(Self::Regex)
                .map_err(|err| LoglessError::pattern(err.to_string())),
            SearchKind::FullText => Ok(Self::Terms(
                query
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect(),
            )),
        }
    }

    /// Query terms of a full-text matcher.
    pub fn terms(&self) -> Option<&[String]> {
        match self {
            Self::Terms(terms) => Some(terms),
            Self::Regex(_) => None,
        }
    }

    /// Whether the query occurs anywhere in `line`.
    pub fn is_match(&self, line: &[u8]) -> bool {
        match self {
            Self::Regex(regex) => matches!(regex.is_match(line), Ok(true)),
            Self::Terms(_) => !self.find_ranges(line).is_empty(),
        }
    }

    /// Non-empty byte ranges of every occurrence in `line`, in order.
    pub fn find_ranges(&self, line: &[u8]) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        match self {
            Self::Regex(regex) => {
                let _ = regex.find_iter(line, |m| {
                    if m.start() < m.end() {
                        ranges.push((m.start(), m.end()));
                    }
                    true
                });
            }
            Self::Terms(terms) => {
                let folded = line.to_ascii_lowercase();
                for term in terms.iter().filter(|term| !term.is_empty()) {
                    for start in folded.find_iter(term.as_bytes()) {
                        ranges.push((start, start + term.len()));
                    }
                }
                ranges.sort_unstable();
                ranges.dedup_by(|next, prev| next.0 < prev.1);
            }
        }
        ranges
    }
}

/// Find the first matching line starting at `head_line`.
///
/// A progressive scan starts one line past `head_line` in `direction`, so the
/// line under the cursor is never reported again.
pub fn match_commit(
    lines: CommitLines<'_>,
    head_line: usize,
    direction: SearchDirection,
    progressive: bool,
    filter: LineFilter,
    matcher: &Matcher,
) -> Option<usize> {
    let count = lines.len();
    if count == 0 {
        return None;
    }
    let mut start = head_line.min(count - 1);
    if progressive {
        start = match direction {
            SearchDirection::Forward if start + 1 < count => start + 1,
            SearchDirection::Backward if start > 0 => start - 1,
            _ => return None,
        };
    }

    // Message lines end where the diff begins
    let limit = match filter {
        LineFilter::CommitMessage => lines
            .iter()
            .position(|line| line.starts_with(b"diff "))
            .unwrap_or(count),
        _ => count,
    };

    let hit = |i: &usize| {
        *i < limit
            && lines
                .get(*i)
                .is_some_and(|line| filter.accepts(line) && matcher.is_match(line))
    };

    match direction {
        SearchDirection::Forward => (start..count).find(hit),
        SearchDirection::Backward => (0..=start).rev().find(hit),
    }
}
