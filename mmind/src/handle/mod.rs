use std::io::{self, Seek, SeekFrom};
use std::sync::Arc;

use crate::core::{seek, Interrupt, SessionService, Whence};
use crate::errors::Result;
use crate::session::GuessSession;

/// An open handle on a shared session with its own position.
///
/// Reading is implemented in `reader`, writing in `writer`. Every call takes
/// the session lock for its whole duration; a raised [`Interrupt`] cancels a
/// call still waiting for the lock.
#[derive(Debug, Clone)]
pub struct GuessHandle {
    pub(crate) service: Arc<SessionService>,
    pub(crate) interrupt: Interrupt,
    pub(crate) pos: u64,
}

impl GuessHandle {
    pub fn open(service: Arc<SessionService>) -> GuessHandle {
        GuessHandle {
            service,
            interrupt: Interrupt::new(),
            pos: 0,
        }
    }

    /// Cancels lock waits when `interrupt` is raised.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> GuessHandle {
        self.interrupt = interrupt;
        self
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub(crate) fn locked<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut GuessSession) -> Result<R>,
    {
        self.service.with_session(&self.interrupt, f)
    }

    /// Moves the position. Only seeking from the end needs the lock.
    pub fn seek_to(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let pos = match whence {
            Whence::End => {
                let current = self.pos;
                self.locked(|s| s.store().seek(current, offset, whence))?
            }
            _ => seek(self.pos, 0, offset, whence)?,
        };
        self.pos = pos;
        Ok(pos)
    }
}

impl Seek for GuessHandle {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let pos = match from {
            SeekFrom::Start(pos) => {
                self.pos = pos;
                pos
            }
            SeekFrom::Current(delta) => self.seek_to(delta, Whence::Current)?,
            SeekFrom::End(delta) => self.seek_to(delta, Whence::End)?,
        };
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionConfig;
    use std::error::Error;

    #[test]
    fn seeks_are_relative_to_the_handle() -> std::result::Result<(), Box<dyn Error>> {
        let service = SessionService::new(&SessionConfig::default())?;
        let mut a = GuessHandle::open(service.clone());
        let b = GuessHandle::open(service);

        assert_eq!(a.seek(SeekFrom::Start(40))?, 40);
        assert_eq!(a.seek(SeekFrom::Current(-8))?, 32);
        assert_eq!(b.position(), 0);
        assert_eq!(a.seek(SeekFrom::End(5))?, 5);

        let err = a.seek(SeekFrom::Current(-6)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(a.position(), 5);

        // Beyond capacity is a legal position.
        assert_eq!(a.seek(SeekFrom::Start(1 << 40))?, 1 << 40);
        Ok(())
    }
}
