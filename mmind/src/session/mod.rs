use tracing::{debug, info, warn};

use crate::core::{check_record_fits, PagedStore, SessionConfig, StoreConfig};
use crate::errors::{MmindError, Result};
use crate::record::FeedbackRecord;
use crate::scoring::Code;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Exhausted,
}

/// One game: a secret, an attempt quota, and the store holding one
/// feedback record per accepted guess.
///
/// Record `n` (zero based) lives in slot `n`, padded with zeros to a full
/// quantum.
#[derive(Debug)]
pub struct GuessSession {
    store: PagedStore,
    defaults: StoreConfig,
    secret: Code,
    code_len: usize,
    attempts_used: u32,
    max_attempts: u32,
}

impl GuessSession {
    pub fn new(cfg: &SessionConfig) -> Result<GuessSession> {
        cfg.validate()?;
        Ok(GuessSession {
            store: PagedStore::new(&cfg.store),
            defaults: cfg.store,
            secret: Code::parse(cfg.secret.as_bytes(), cfg.code_len)?,
            code_len: cfg.code_len,
            attempts_used: 0,
            max_attempts: cfg.max_attempts,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.attempts_used < self.max_attempts {
            SessionState::Active
        } else {
            SessionState::Exhausted
        }
    }

    #[inline]
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.attempts_used
    }

    #[inline]
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    #[inline]
    pub fn store(&self) -> &PagedStore {
        &self.store
    }

    pub fn size(&self) -> u64 {
        self.store.size()
    }

    /// Geometry of the live store.
    pub fn geometry(&self) -> StoreConfig {
        self.store.geometry()
    }

    /// Geometry the store adopts at the next truncate.
    pub fn defaults(&self) -> StoreConfig {
        self.defaults
    }

    /// Replaces the default geometry. The live store keeps its geometry
    /// until the next truncate.
    pub fn set_geometry(&mut self, geometry: StoreConfig) -> Result<()> {
        geometry.validate()?;
        check_record_fits(&geometry, self.code_len)?;
        debug!(quantum = geometry.quantum, qset = geometry.qset, "default geometry updated");
        self.defaults = geometry;
        Ok(())
    }

    /// Scores `candidate` and appends its record in the next slot.
    /// On any error the session is left exactly as it was.
    pub fn submit(&mut self, candidate: Code) -> Result<FeedbackRecord> {
        if self.state() == SessionState::Exhausted {
            warn!(max_attempts = self.max_attempts, "can't add guess, quota exhausted");
            return Err(MmindError::QuotaExceeded {
                max_attempts: self.max_attempts,
            });
        }
        if candidate.len() != self.code_len {
            return Err(MmindError::InvalidArgument(format!(
                "candidate has {} digits, expected {}",
                candidate.len(),
                self.code_len
            )));
        }

        let quantum = self.store.quantum();
        let offset = u64::from(self.attempts_used) * quantum as u64;
        if offset >= self.store.capacity() {
            return Err(MmindError::CapacityExceeded);
        }

        let attempt_index = self.attempts_used + 1;
        let score = candidate.score_against(&self.secret);
        let record = FeedbackRecord::new(candidate, score, attempt_index);

        let line = record.encode();
        let mut chunk = vec![0u8; quantum];
        let len = line.len().min(quantum);
        chunk[..len].copy_from_slice(&line[..len]);
        self.store.write_at(offset, &chunk)?;

        self.attempts_used = attempt_index;
        debug!(attempt = attempt_index, exact = score.exact, color = score.color, "guess accepted");
        Ok(record)
    }

    /// Every stored record, in submission order.
    pub fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        let last = match self.store.last_slot() {
            Some(last) => last,
            None => return Ok(Vec::new()),
        };
        let quantum = self.store.quantum() as u64;
        let mut records = Vec::with_capacity(last + 1);
        for slot in 0..=last {
            if let Some(chunk) = self.store.chunk(slot) {
                let start = slot as u64 * quantum;
                let visible = (self.store.size() - start).min(chunk.len() as u64) as usize;
                records.push(FeedbackRecord::decode(&chunk[..visible])?);
            }
        }
        Ok(records)
    }

    /// Drops every record and restores the full quota.
    pub fn truncate(&mut self) {
        self.store.truncate(&self.defaults);
        self.attempts_used = 0;
    }

    pub fn new_game(&mut self, secret: Code) -> Result<()> {
        if secret.len() != self.code_len {
            return Err(MmindError::InvalidArgument(format!(
                "secret has {} digits, expected {}",
                secret.len(),
                self.code_len
            )));
        }
        self.truncate();
        self.secret = secret;
        info!("new game started");
        Ok(())
    }

    pub fn end_game(&mut self) {
        self.truncate();
        info!("game ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    type TestResult = std::result::Result<(), Box<dyn Error>>;

    fn session(max_attempts: u32) -> GuessSession {
        let cfg = SessionConfig::builder()
            .max_attempts(max_attempts)
            .build()
            .unwrap();
        GuessSession::new(&cfg).unwrap()
    }

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn submit_scores_and_stores() -> TestResult {
        let mut s = session(10);
        let record = s.submit(code("2222"))?;
        assert_eq!(record.exact_matches, 1);
        assert_eq!(record.color_matches, 0);
        assert_eq!(record.attempt_index, 1);
        assert_eq!(s.size(), 16);

        let mut buf = [0u8; 16];
        assert_eq!(s.store().read_at(0, &mut buf), 16);
        assert_eq!(&buf[..15], b"2222 1+0- 0001\n");
        assert_eq!(buf[15], 0);
        Ok(())
    }

    #[test]
    fn read_all_returns_records_in_order() -> TestResult {
        let mut s = session(10);
        let guesses = ["1234", "4283", "8234", "0000"];
        for g in guesses.iter() {
            s.submit(code(g))?;
        }
        let records = s.read_all()?;
        assert_eq!(records.len(), guesses.len());
        for (i, (record, g)) in records.iter().zip(guesses.iter()).enumerate() {
            assert_eq!(record.attempt_index, i as u32 + 1);
            assert_eq!(record.candidate, code(g));
        }
        assert_eq!((records[1].exact_matches, records[1].color_matches), (4, 0));
        assert_eq!((records[2].exact_matches, records[2].color_matches), (1, 3));
        Ok(())
    }

    #[test]
    fn quota_is_enforced_without_side_effects() -> TestResult {
        let mut s = session(2);
        s.submit(code("1111"))?;
        s.submit(code("2222"))?;
        assert_eq!(s.state(), SessionState::Exhausted);
        let size = s.size();

        let err = s.submit(code("4283")).unwrap_err();
        assert_eq!(err, MmindError::QuotaExceeded { max_attempts: 2 });
        assert_eq!(s.attempts_used(), 2);
        assert_eq!(s.size(), size);
        assert_eq!(s.read_all()?.len(), 2);
        Ok(())
    }

    #[test]
    fn truncate_restores_quota() -> TestResult {
        let mut s = session(3);
        s.submit(code("1111"))?;
        s.truncate();
        assert!(s.read_all()?.is_empty());
        assert_eq!(s.remaining(), 3);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.store().allocated_chunks(), 0);
        Ok(())
    }

    #[test]
    fn new_game_swaps_the_secret() -> TestResult {
        let mut s = session(3);
        s.submit(code("1111"))?;
        s.new_game(code("1234"))?;
        assert_eq!(s.attempts_used(), 0);
        let record = s.submit(code("1234"))?;
        assert_eq!(record.exact_matches, 4);
        assert_eq!(record.attempt_index, 1);
        assert!(s.new_game(code("12345")).is_err());
        Ok(())
    }

    #[test]
    fn wrong_length_candidate_is_rejected() {
        let mut s = session(3);
        assert!(matches!(s.submit(code("123")), Err(MmindError::InvalidArgument(_))));
        assert_eq!(s.attempts_used(), 0);
        assert_eq!(s.size(), 0);
    }

    #[test]
    fn capacity_bounds_the_number_of_records() -> TestResult {
        let cfg = SessionConfig::builder().qset(2).max_attempts(5).build()?;
        let mut s = GuessSession::new(&cfg)?;
        s.submit(code("1111"))?;
        s.submit(code("2222"))?;
        assert_eq!(s.submit(code("3333")), Err(MmindError::CapacityExceeded));
        assert_eq!(s.attempts_used(), 2);
        assert_eq!(s.remaining(), 3);
        Ok(())
    }

    #[test]
    fn geometry_change_waits_for_truncate() -> TestResult {
        let mut s = session(10);
        s.submit(code("1111"))?;
        s.set_geometry(StoreConfig { quantum: 32, qset: 8 })?;
        assert_eq!(s.geometry(), StoreConfig { quantum: 16, qset: 256 });

        s.submit(code("2222"))?;
        assert_eq!(s.size(), 32);

        s.end_game();
        assert_eq!(s.geometry(), StoreConfig { quantum: 32, qset: 8 });
        s.submit(code("3333"))?;
        assert_eq!(s.size(), 32);
        assert_eq!(s.read_all()?[0].candidate, code("3333"));

        assert!(s.set_geometry(StoreConfig { quantum: 8, qset: 8 }).is_err());
        Ok(())
    }
}
