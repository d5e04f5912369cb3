mod arena;
mod service;
mod store;

pub use arena::{ChunkArena, ChunkId};
pub use service::{Interrupt, SessionService};
pub use store::{seek, PagedStore, Whence};

use serde_derive::{Deserialize, Serialize};

use crate::errors::{MmindError, Result};
use crate::record::{FeedbackRecord, MAX_ENCODED_ATTEMPT, MAX_ENCODED_CODE_LEN};

pub const DEFAULT_QUANTUM: usize = 16;
pub const DEFAULT_QSET: usize = 256;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_CODE_LEN: usize = 4;
pub const DEFAULT_SECRET: &str = "4283";

/// Geometry of a paged store: chunk size and slot-table capacity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub quantum: usize,
    pub qset: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder {
            inner: StoreConfig::default(),
        }
    }

    /// Total number of addressable bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.quantum.saturating_mul(self.qset)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(MmindError::Config("quantum must be positive".to_string()));
        }
        if self.qset == 0 {
            return Err(MmindError::Config("qset must be positive".to_string()));
        }
        Ok(())
    }
}

pub struct StoreConfigBuilder {
    inner: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn quantum(mut self, quantum: usize) -> Self {
        self.inner.quantum = quantum;
        self
    }

    pub fn qset(mut self, qset: usize) -> Self {
        self.inner.qset = qset;
        self
    }

    pub fn build(self) -> Result<StoreConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Everything needed to start a game on a fresh store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub store: StoreConfig,
    pub max_attempts: u32,
    pub code_len: usize,
    pub secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            store: StoreConfig::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            code_len: DEFAULT_CODE_LEN,
            secret: DEFAULT_SECRET.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            inner: SessionConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if self.max_attempts == 0 || self.max_attempts > MAX_ENCODED_ATTEMPT {
            return Err(MmindError::Config(format!(
                "max_attempts must be within 1..={}",
                MAX_ENCODED_ATTEMPT
            )));
        }
        if self.code_len > MAX_ENCODED_CODE_LEN {
            return Err(MmindError::Config(format!(
                "code_len must be at most {}",
                MAX_ENCODED_CODE_LEN
            )));
        }
        if self.secret.len() != self.code_len || !self.secret.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MmindError::Config(format!(
                "secret {:?} is not {} ascii digits",
                self.secret, self.code_len
            )));
        }
        check_record_fits(&self.store, self.code_len)
    }
}

/// One encoded feedback line must fit in a single chunk.
pub(crate) fn check_record_fits(store: &StoreConfig, code_len: usize) -> Result<()> {
    let needed = FeedbackRecord::encoded_len(code_len);
    if store.quantum < needed {
        return Err(MmindError::Config(format!(
            "quantum {} is smaller than a {}-byte feedback record",
            store.quantum, needed
        )));
    }
    Ok(())
}

pub struct SessionConfigBuilder {
    inner: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.inner.store = store;
        self
    }

    pub fn quantum(mut self, quantum: usize) -> Self {
        self.inner.store.quantum = quantum;
        self
    }

    pub fn qset(mut self, qset: usize) -> Self {
        self.inner.store.qset = qset;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.inner.max_attempts = max_attempts;
        self
    }

    pub fn code_len(mut self, code_len: usize) -> Self {
        self.inner.code_len = code_len;
        self
    }

    pub fn secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.inner.secret = secret.into();
        self
    }

    pub fn build(self) -> Result<SessionConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cfg = SessionConfig::builder().build()?;
        assert_eq!(cfg.store.quantum, 16);
        assert_eq!(cfg.store.qset, 256);
        assert_eq!(cfg.store.capacity(), 4096);
        assert_eq!(cfg.max_attempts, 10);
        assert_eq!(cfg.secret, "4283");
        Ok(())
    }

    #[test]
    fn rejects_zero_geometry() {
        assert!(matches!(
            StoreConfig::builder().quantum(0).build(),
            Err(MmindError::Config(_))
        ));
        assert!(matches!(
            StoreConfig::builder().qset(0).build(),
            Err(MmindError::Config(_))
        ));
    }

    #[test]
    fn rejects_bad_secret() {
        assert!(SessionConfig::builder().secret("42a3").build().is_err());
        assert!(SessionConfig::builder().secret("428").build().is_err());
        assert!(SessionConfig::builder().secret("42831").build().is_err());
    }

    #[test]
    fn rejects_quantum_smaller_than_record() {
        // "4283 4+0- 0001\n" is 15 bytes
        assert!(SessionConfig::builder().quantum(14).build().is_err());
        assert!(SessionConfig::builder().quantum(15).build().is_ok());
    }

    #[test]
    fn rejects_attempts_outside_the_record_format() {
        assert!(SessionConfig::builder().max_attempts(0).build().is_err());
        assert!(SessionConfig::builder().max_attempts(10_000).build().is_err());
        assert!(SessionConfig::builder().max_attempts(9_999).build().is_ok());
    }}
