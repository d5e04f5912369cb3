use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use super::SessionConfig;
use crate::errors::{MmindError, Result};
use crate::session::GuessSession;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Cancellation flag for lock waits. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Interrupt {
        Interrupt::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }

    /// The underlying flag, for registering with a signal handler.
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.raised.clone()
    }
}

/// A guess session behind its single lock. Every access, read or write,
/// takes the lock exclusively for the duration of the closure.
#[derive(Debug)]
pub struct SessionService {
    session: Mutex<GuessSession>,
}

impl SessionService {
    pub fn new(cfg: &SessionConfig) -> Result<Arc<SessionService>> {
        let session = GuessSession::new(cfg)?;
        Ok(Arc::new(SessionService {
            session: Mutex::new(session),
        }))
    }

    fn lock(&self, interrupt: &Interrupt) -> Result<MutexGuard<'_, GuessSession>> {
        if let Some(guard) = self.session.try_lock() {
            return Ok(guard);
        }
        trace!("session lock contended");
        loop {
            if interrupt.is_raised() {
                return Err(MmindError::Interrupted);
            }
            if let Some(guard) = self.session.try_lock_for(LOCK_POLL_INTERVAL) {
                return Ok(guard);
            }
        }
    }

    pub fn with_session<R, F>(&self, interrupt: &Interrupt, f: F) -> Result<R>
    where
        F: FnOnce(&mut GuessSession) -> Result<R>,
    {
        let mut guard = self.lock(interrupt)?;
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn uncontended_lock_ignores_raised_interrupt() -> std::result::Result<(), Box<dyn Error>> {
        let service = SessionService::new(&SessionConfig::default())?;
        let interrupt = Interrupt::new();
        interrupt.raise();
        let remaining = service.with_session(&interrupt, |s| Ok(s.remaining()))?;
        assert_eq!(remaining, 10);
        Ok(())
    }

    #[test]
    fn raised_interrupt_cancels_a_wait() -> std::result::Result<(), Box<dyn Error>> {
        let service = SessionService::new(&SessionConfig::default())?;
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let service = service.clone();
            thread::spawn(move || {
                service.with_session(&Interrupt::new(), |_| {
                    held_tx.send(()).ok();
                    release_rx.recv().ok();
                    Ok(())
                })
            })
        };
        held_rx.recv()?;

        let interrupt = Interrupt::new();
        let waiter = {
            let service = service.clone();
            let interrupt = interrupt.clone();
            thread::spawn(move || {
                service.with_session(&interrupt, |s| s.submit("1234".parse()?).map(|_| ()))
            })
        };
        thread::sleep(Duration::from_millis(30));
        interrupt.raise();
        assert_eq!(waiter.join().map_err(|_| "waiter panicked")?, Err(MmindError::Interrupted));

        release_tx.send(())?;
        holder.join().map_err(|_| "holder panicked")??;

        let used = service.with_session(&Interrupt::new(), |s| Ok(s.attempts_used()))?;
        assert_eq!(used, 0);
        Ok(())
    }
}
