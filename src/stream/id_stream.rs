//! Fixed-size id records: `<40 hex chars>\n`.

use crate::commit::{CommitId, COMMIT_ID_LEN};
use crate::error::{LoglessError, Result};
use crate::stream::{read_retrying, CommitRecord, RecordReader};
use std::io::Read;

/// Record size including the trailing newline.
pub const ID_RECORD_LEN: usize = COMMIT_ID_LEN + 1;

/// Frames one 41-byte record per call.
///
/// The final record may lack its newline (`git log --pretty=format:%H`
/// does not terminate the last line).
pub struct IdStreamReader<R> {
    input: R,
    exhausted: bool,
}

impl<R: Read> IdStreamReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<R: Read> RecordReader for IdStreamReader<R> {
    fn next_record(&mut self) -> Result<Option<CommitRecord>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut record = [0u8; ID_RECORD_LEN];
        let mut filled = 0;
        while filled < ID_RECORD_LEN {
            let n = read_retrying(&mut self.input, &mut record[filled..])?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            filled += n;
        }

        match filled {
            0 => Ok(None),
            COMMIT_ID_LEN => commit_record(&record[..COMMIT_ID_LEN]).map(Some),
            ID_RECORD_LEN if record[COMMIT_ID_LEN] == b'\n' => {
                commit_record(&record[..COMMIT_ID_LEN]).map(Some)
            }
            ID_RECORD_LEN => Err(LoglessError::malformed(
                "id record is not terminated by a newline",
            )),
            short => Err(LoglessError::malformed(format!(
                "truncated id record of {short} bytes at end of stream"
            ))),
        }
    }
}

fn commit_record(raw: &[u8]) -> Result<CommitRecord> {
    Ok(CommitRecord {
        commit_id: CommitId::parse(raw)?,
        text: None,
    })
}
