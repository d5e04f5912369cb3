use std::io::{self, Read};

use tracing::trace;

use crate::errors::Result;
use crate::handle::GuessHandle;
use crate::record::FeedbackRecord;

impl GuessHandle {
    /// Copies stored bytes from the handle position. A single call never
    /// crosses a chunk boundary; zero means end of data.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pos = self.pos;
        let count = self.locked(|s| Ok(s.store().read_at(pos, buf)))?;
        self.pos += count as u64;
        trace!(pos = self.pos, count, "bytes read");
        Ok(count)
    }

    /// Decodes every stored record, independent of the handle position.
    pub fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        self.locked(|s| s.read_all())
    }

    pub fn remaining(&self) -> Result<u32> {
        self.locked(|s| Ok(s.remaining()))
    }
}

impl Read for GuessHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_bytes(buf)?)
    }
}
