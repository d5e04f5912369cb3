use std::io::{self, Write};

use tracing::trace;

use crate::errors::{MmindError, Result};
use crate::handle::GuessHandle;
use crate::record::FeedbackRecord;
use crate::scoring::Code;

impl GuessHandle {
    /// Submits the guess held in the first `code_len` bytes of `buf`.
    ///
    /// Returns the number of bytes consumed, which is all of `buf`, or zero
    /// once the handle position or the next record slot is past capacity.
    /// The position advances by one quantum per accepted guess.
    pub fn write_guess(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(match self.write_record(buf)? {
            Some(_) => buf.len(),
            None => 0,
        })
    }

    /// Like `write_guess`, but hands back the feedback stored for this guess,
    /// taken under the same lock as the submission.
    pub fn write_record(&mut self, buf: &[u8]) -> Result<Option<FeedbackRecord>> {
        if buf.is_empty() {
            return Ok(None);
        }
        let pos = self.pos;
        let submitted = self.locked(|s| {
            if pos >= s.store().capacity() {
                return Ok(None);
            }
            let code_len = s.code_len();
            if buf.len() < code_len {
                return Err(MmindError::InvalidArgument(format!(
                    "guess needs {} bytes, got {}",
                    code_len,
                    buf.len()
                )));
            }
            let candidate = Code::parse(&buf[..code_len], code_len)?;
            match s.submit(candidate) {
                Ok(record) => Ok(Some((record, s.store().quantum() as u64))),
                Err(MmindError::CapacityExceeded) => Ok(None),
                Err(e) => Err(e),
            }
        })?;

        Ok(submitted.map(|(record, step)| {
            self.pos += step;
            trace!(pos = self.pos, attempt = record.attempt_index, "guess written");
            record
        }))
    }

    /// Submits an already parsed guess, bypassing the byte surface.
    pub fn submit(&self, candidate: Code) -> Result<FeedbackRecord> {
        self.locked(|s| s.submit(candidate))
    }
}

impl Write for GuessHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_guess(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
