use std::cmp;
use std::convert::TryFrom;

use tracing::{debug, trace};

use super::arena::{ChunkArena, ChunkId};
use super::StoreConfig;
use crate::errors::{MmindError, Result};

/// Origin of a seek.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl TryFrom<i32> for Whence {
    type Error = MmindError;

    fn try_from(raw: i32) -> Result<Whence> {
        match raw {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(MmindError::InvalidArgument(format!("whence {}", other))),
        }
    }
}

/// Resolves a seek to an absolute position. Positions past the end, or past
/// capacity, are legal; negative ones are not.
pub fn seek(current: u64, size: u64, offset: i64, whence: Whence) -> Result<u64> {
    let base = match whence {
        Whence::Start => 0i128,
        Whence::Current => current as i128,
        Whence::End => size as i128,
    };
    let pos = base + offset as i128;
    if pos < 0 {
        return Err(MmindError::InvalidArgument(format!("negative position {}", pos)));
    }
    u64::try_from(pos).map_err(|_| MmindError::InvalidArgument(format!("position {} overflows", pos)))
}

/// A sparse byte store: logical offsets map onto `qset` slots of `quantum`
/// bytes each. Slots get a chunk on first write and keep it until truncate.
#[derive(Debug)]
pub struct PagedStore {
    arena: ChunkArena,
    // Allocated on the first write.
    slots: Option<Vec<Option<ChunkId>>>,
    quantum: usize,
    qset: usize,
    // High-water mark.
    size: u64,
}

impl PagedStore {
    pub fn new(cfg: &StoreConfig) -> PagedStore {
        PagedStore {
            arena: ChunkArena::new(),
            slots: None,
            quantum: cfg.quantum,
            qset: cfg.qset,
            size: 0,
        }
    }

    #[inline]
    pub fn quantum(&self) -> usize {
        self.quantum
    }

    #[inline]
    pub fn qset(&self) -> usize {
        self.qset
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        (self.quantum as u64).saturating_mul(self.qset as u64)
    }

    pub fn geometry(&self) -> StoreConfig {
        StoreConfig {
            quantum: self.quantum,
            qset: self.qset,
        }
    }

    /// Number of chunks currently allocated.
    pub fn allocated_chunks(&self) -> usize {
        self.arena.live()
    }

    #[inline]
    fn locate(&self, offset: u64) -> (usize, usize) {
        let quantum = self.quantum as u64;
        ((offset / quantum) as usize, (offset % quantum) as usize)
    }

    /// Writes into the single chunk containing `offset`; never crosses into
    /// the next one. Returns the number of bytes written.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<usize> {
        if offset >= self.capacity() {
            return Err(MmindError::CapacityExceeded);
        }
        let (slot, within) = self.locate(offset);

        if self.slots.is_none() {
            let mut table = Vec::new();
            table.try_reserve_exact(self.qset)?;
            table.resize_with(self.qset, || None);
            self.slots = Some(table);
        }
        let slots = self.slots.get_or_insert_with(Vec::new);
        let id = match slots[slot].take() {
            Some(id) => id,
            None => self.arena.allocate(self.quantum)?,
        };

        let chunk = self.arena.get_mut(&id);
        let count = cmp::min(bytes.len(), chunk.len().saturating_sub(within));
        chunk[within..within + count].copy_from_slice(&bytes[..count]);
        slots[slot] = Some(id);

        let end = offset + count as u64;
        if end > self.size {
            self.size = end;
        }
        trace!(offset, slot, count, size = self.size, "write_at");
        Ok(count)
    }

    /// Copies from the chunk containing `offset` into `buf`, stopping at the
    /// high-water mark and at the chunk boundary. Zero means end of data.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        if offset >= self.size {
            return 0;
        }
        let (slot, within) = self.locate(offset);
        let chunk = match self.chunk(slot) {
            Some(chunk) => chunk,
            None => return 0,
        };
        let available = cmp::min(self.size - offset, chunk.len().saturating_sub(within) as u64) as usize;
        let count = cmp::min(buf.len(), available);
        buf[..count].copy_from_slice(&chunk[within..within + count]);
        trace!(offset, slot, count, "read_at");
        count
    }

    /// The chunk backing `slot`, if one was ever written.
    pub fn chunk(&self, slot: usize) -> Option<&[u8]> {
        self.slots
            .as_ref()
            .and_then(|slots| slots.get(slot))
            .and_then(|entry| entry.as_ref())
            .map(|id| self.arena.get(id))
    }

    /// Index of the slot holding the last written byte.
    pub fn last_slot(&self) -> Option<usize> {
        if self.size == 0 {
            None
        } else {
            Some(self.locate(self.size - 1).0)
        }
    }

    pub fn seek(&self, current: u64, offset: i64, whence: Whence) -> Result<u64> {
        seek(current, self.size, offset, whence)
    }

    /// Frees every chunk and adopts `defaults` as the new geometry.
    pub fn truncate(&mut self, defaults: &StoreConfig) {
        let mut freed = 0usize;
        if let Some(slots) = self.slots.take() {
            for id in slots.into_iter().flatten() {
                self.arena.free(id);
                freed += 1;
            }
        }
        self.arena.reset();
        self.quantum = defaults.quantum;
        self.qset = defaults.qset;
        self.size = 0;
        debug!(freed, quantum = self.quantum, qset = self.qset, "store truncated");
    }
}
