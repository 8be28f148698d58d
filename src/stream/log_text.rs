//! Full log text framing.
//!
//! Records are separated where a line starting with `commit ` follows a blank
//! line. Record length is unbounded, so the read buffer doubles whenever it is
//! full and is released once the final record has been drained.

use crate::commit::{index::COMMIT_HEADER, CommitId};
use crate::error::{LoglessError, Result};
use crate::stream::{read_retrying, CommitRecord, RecordReader};
use bstr::ByteSlice;
use std::io::Read;

/// Initial read buffer capacity.
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Boundary scanner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Inside a line, waiting for its newline
    InLine,
    /// At the start of a line; `blank` when the previous line was empty
    LineStart { blank: bool },
}

/// Resumable scanner for the `\n\ncommit ` boundary.
#[derive(Debug, Clone)]
struct BoundaryScanner {
    state: Scan,
    pos: usize,
}

impl BoundaryScanner {
    fn new() -> Self {
        Self {
            state: Scan::InLine,
            pos: 0,
        }
    }

    /// Offset of the next record's `commit ` line within `buf`, if complete.
    ///
    /// Stops without consuming a candidate that is too short to decide yet.
    fn find(&mut self, buf: &[u8]) -> Option<usize> {
        while self.pos < buf.len() {
            let byte = buf[self.pos];
            match self.state {
                Scan::InLine => {
                    if byte == b'\n' {
                        self.state = Scan::LineStart { blank: false };
                    }
                }
                Scan::LineStart { blank } => {
                    if byte == b'\n' {
                        self.state = Scan::LineStart { blank: true };
                    } else if blank && byte == COMMIT_HEADER[0] {
                        if buf.len() - self.pos < COMMIT_HEADER.len() {
                            return None;
                        }
                        if buf[self.pos..].starts_with(COMMIT_HEADER) {
                            return Some(self.pos);
                        }
                        self.state = Scan::InLine;
                    } else {
                        self.state = Scan::InLine;
                    }
                }
            }
            self.pos += 1;
        }
        None
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Frames `git log` text one commit at a time.
pub struct LogTextReader<R> {
    input: R,
    buf: Vec<u8>,
    used: usize,
    scanner: BoundaryScanner,
    input_done: bool,
}

impl<R: Read> LogTextReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: vec![0; INITIAL_BUFFER_SIZE],
            used: 0,
            scanner: BoundaryScanner::new(),
            input_done: false,
        }
    }

    /// Current read buffer capacity (0 once released).
    pub fn buffer_capacity(&self) -> usize {
        self.buf.len()
    }

    fn fill_more(&mut self) -> Result<usize> {
        if self.used == self.buf.len() {
            let grown = (self.buf.len() * 2).max(INITIAL_BUFFER_SIZE);
            self.buf.resize(grown, 0);
        }
        let n = read_retrying(&mut self.input, &mut self.buf[self.used..])?;
        self.used += n;
        Ok(n)
    }

    /// Split off `buf[..end]` as one record and shift the remainder down.
    fn take_record(&mut self, end: usize) -> Vec<u8> {
        let record = self.buf[..end].to_vec();
        self.buf.copy_within(end..self.used, 0);
        self.used -= end;
        self.scanner.reset();
        record
    }

    fn release_buffer(&mut self) {
        self.buf = Vec::new();
        self.used = 0;
    }


    /// Raw text of the next record, blank separators included.
    fn frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(start) = self.scanner.find(&self.buf[..self.used]) {
                // Drop the blank separator line from the record
                let mut record = self.take_record(start);
                record.pop();
                return Ok(Some(record));
            }

            if self.input_done {
                if self.used == 0 {
                    return Ok(None);
                }
                let end = self.used;
                let record = self.take_record(end);
                self.release_buffer();
                return Ok(Some(record));
            }

            if self.fill_more()? == 0 {
                self.input_done = true;
                log::debug!("log stream drained, {} bytes pending", self.used);
            }
        }
    }
}

impl<R: Read> RecordReader for LogTextReader<R> {
    fn next_record(&mut self) -> Result<Option<CommitRecord>> {
        loop {
            let Some(text) = self.frame()? else {
                return Ok(None);
            };
            if text.trim().is_empty() {
                continue;
            }

            let header = text.lines().next().unwrap_or_default();
            let commit_id = CommitId::from_header(header).map_err(|err| {
                LoglessError::malformed(format!("cannot frame log record: {err}"))
            })?;

            return Ok(Some(CommitRecord {
                commit_id,
                text: Some(text),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn log_text() -> String {
        format!(
            "commit {A}\nAuthor: x\n\n    first\n\ndiff --git a/f b/f\n+added\n\n\
commit {B}\nAuthor: y\n\n    second\n"
        )
    }

    /// Reader that hands out at most `chunk` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_frames_two_records() {
        let mut reader = LogTextReader::new(Cursor::new(log_text().into_bytes()));

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.commit_id.as_str(), A);
        let text = first.text.unwrap();
        assert!(text.ends_with(b"+added\n"));

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.commit_id.as_str(), B);
        assert!(second.text.unwrap().starts_with(b"commit bbbb"));

        assert!(reader.next_record().unwrap().is_none());
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.buffer_capacity(), 0);
    }

    #[test]
    fn test_boundary_split_across_reads() {
        for chunk in [1, 3, 7, 64] {
            let mut reader = LogTextReader::new(Trickle {
                data: log_text().into_bytes(),
                pos: 0,
                chunk,
            });
            assert_eq!(reader.next_record().unwrap().unwrap().commit_id.as_str(), A);
            assert_eq!(reader.next_record().unwrap().unwrap().commit_id.as_str(), B);
            assert!(reader.next_record().unwrap().is_none());
        }
    }

    #[test]
    fn test_buffer_grows_for_long_records() {
        let body = "+line\n".repeat(4000);
        let input = format!("commit {A}\n\n    big\n\n{body}\ncommit {B}\n");
        let mut reader = LogTextReader::new(Cursor::new(input.into_bytes()));

        let first = reader.next_record().unwrap().unwrap();
        assert!(first.text.unwrap().len() > INITIAL_BUFFER_SIZE);
        assert!(reader.buffer_capacity() > INITIAL_BUFFER_SIZE);
    }

    #[test]
    fn test_commit_word_inside_message_is_not_a_boundary() {
        let input = format!("commit {A}\n\n    commit to this\ncommit message\n");
        let mut reader = LogTextReader::new(Cursor::new(input.into_bytes()));
        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let mut reader = LogTextReader::new(Cursor::new(b"not a log\n".to_vec()));
        assert!(matches!(
            reader.next_record(),
            Err(LoglessError::MalformedRecord { .. })
        ));
    }
}
