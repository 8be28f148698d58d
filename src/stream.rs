//! Framing of the incoming log stream into commit records.
//!
//! Two record shapes are supported:
//!
//! - [`IdStreamReader`]: fixed 41-byte records (`<40 hex>\n`), as produced by
//!   `git log --pretty=format:%H`. Bodies are fetched later on demand.
//! - [`LogTextReader`]: full `git log [-p]` text where a record starts at a
//!   `commit ` line that follows a blank line. The body arrives with the record.
//!
//! Both are resumable: each call frames exactly one more record and keeps the
//! unread remainder for the next call.

pub mod id_stream;
pub mod log_text;

pub use id_stream::IdStreamReader;
pub use log_text::LogTextReader;

use crate::commit::{index::COMMIT_HEADER, CommitId, COMMIT_ID_LEN};
use crate::error::{LoglessError, Result};
use std::io::{self, Cursor, Read};

/// One framed commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub commit_id: CommitId,
    /// Full text when the stream carries it (log-text mode)
    pub text: Option<Vec<u8>>,
}

/// Source of framed commit records, oldest last.
pub trait RecordReader {
    /// Frame the next record; `Ok(None)` once the stream is exhausted.
    fn next_record(&mut self) -> Result<Option<CommitRecord>>;
}

/// Which framing strategy to apply to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum InputFormat {
    /// Decide from the first bytes of the stream
    Auto,
    /// 41-byte id records
    Ids,
    /// Full log text
    Log,
}

impl std::str::FromStr for InputFormat {
    type Err = LoglessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "ids" => Ok(Self::Ids),
            "log" => Ok(Self::Log),
            other => Err(LoglessError::InvalidArgument {
                message: format!("unknown input format `{other}` (expected auto, ids or log)"),
            }),
        }
    }
}

/// Read into `buf`, retrying interrupted system calls.
///
/// A return of 0 is authoritative end-of-input.
pub fn read_retrying<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(LoglessError::io("reading the log stream failed", err)),
        }
    }
}

/// Build the record reader for `format`, sniffing the stream when `Auto`.
pub fn open_reader(format: InputFormat, mut input: Box<dyn Read>) -> Result<Box<dyn RecordReader>> {
    let format = match format {
        InputFormat::Auto => {
            let mut prefix = vec![0u8; COMMIT_ID_LEN + 1];
            let mut filled = 0;
            while filled < prefix.len() {
                let n = read_retrying(&mut input, &mut prefix[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            prefix.truncate(filled);

            let detected = detect_format(&prefix);
            log::debug!("detected input format {:?}", detected);
            input = Box::new(Cursor::new(prefix).chain(input));
            detected
        }
        explicit => explicit,
    };

    Ok(match format {
        InputFormat::Log => Box::new(LogTextReader::new(input)),
        _ => Box::new(IdStreamReader::new(input)),
    })
}

/// Classify a stream from its first bytes.
pub fn detect_format(prefix: &[u8]) -> InputFormat {
    if prefix.starts_with(COMMIT_HEADER) {
        return InputFormat::Log;
    }
    let id_len = prefix.len().min(COMMIT_ID_LEN);
    if prefix[..id_len].iter().all(u8::is_ascii_hexdigit) {
        InputFormat::Ids
    } else {
        InputFormat::Log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that fails with `Interrupted` before every successful read.
    struct Flaky<R> {
        inner: R,
        interrupt_next: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupt_next = true;
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_read_retrying_hides_interrupts() {
        let mut reader = Flaky {
            inner: Cursor::new(b"abc".to_vec()),
            interrupt_next: true,
        };
        let mut buf = [0u8; 8];
        assert_eq!(read_retrying(&mut reader, &mut buf).unwrap(), 3);
        assert_eq!(read_retrying(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_retrying_surfaces_other_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
        }
        let mut buf = [0u8; 4];
        assert!(read_retrying(&mut Broken, &mut buf).is_err());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(b"0123456789abcdef0123456789abcdef01234567\n"),
            InputFormat::Ids
        );
        assert_eq!(detect_format(b"commit 0123"), InputFormat::Log);
        assert_eq!(detect_format(b"Author: x"), InputFormat::Log);
    }

    #[test]
    fn test_open_reader_auto_keeps_sniffed_bytes() {
        let input = b"0123456789abcdef0123456789abcdef01234567\n\
89abcdef0123456789abcdef0123456789abcdef\n"
            .to_vec();
        let mut reader = open_reader(InputFormat::Auto, Box::new(Cursor::new(input))).unwrap();

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(
            first.commit_id.as_str(),
            "0123456789abcdef0123456789abcdef01234567"
        );
        assert!(first.text.is_none());
        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_input_format_from_str() {
        assert_eq!("ids".parse::<InputFormat>().unwrap(), InputFormat::Ids);
        assert!("xml".parse::<InputFormat>().is_err());
    }
}
