use tracing::debug;

use crate::errors::Result;

/// Handle to a chunk owned by a [`ChunkArena`].
///
/// Not `Copy` or `Clone`: the only way to give a chunk back is
/// [`ChunkArena::free`], which consumes the handle, so a chunk is freed once.
#[derive(Debug, PartialEq, Eq)]
pub struct ChunkId(usize);

impl ChunkId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Owns every chunk buffer of a store. Freed entries are left as empty
/// buffers and their indices are recycled by later allocations.
#[derive(Debug, Default)]
pub struct ChunkArena {
    chunks: Vec<Box<[u8]>>,
    vacant: Vec<usize>,
}

impl ChunkArena {
    pub fn new() -> ChunkArena {
        ChunkArena::default()
    }

    /// Allocates a zero-filled chunk of exactly `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Result<ChunkId> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)?;
        buf.resize(size, 0u8);
        let buf = buf.into_boxed_slice();

        let index = match self.vacant.pop() {
            Some(index) => {
                self.chunks[index] = buf;
                index
            }
            None => {
                self.chunks.try_reserve(1)?;
                self.chunks.push(buf);
                self.chunks.len() - 1
            }
        };
        debug!(chunk = index, size, "allocated chunk");
        Ok(ChunkId(index))
    }

    pub fn free(&mut self, id: ChunkId) {
        self.chunks[id.0] = Box::default();
        self.vacant.push(id.0);
    }

    #[inline]
    pub fn get(&self, id: &ChunkId) -> &[u8] {
        &self.chunks[id.0]
    }

    #[inline]
    pub fn get_mut(&mut self, id: &ChunkId) -> &mut [u8] {
        &mut self.chunks[id.0]
    }

    /// Number of chunks currently live.
    pub fn live(&self) -> usize {
        self.chunks.len() - self.vacant.len()
    }

    /// Drops every buffer. Only valid once all handles have been freed.
    pub fn reset(&mut self) {
        self.chunks = Vec::new();
        self.vacant = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_zeroed_chunks() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut arena = ChunkArena::new();
        let id = arena.allocate(16)?;
        assert_eq!(arena.get(&id).len(), 16);
        assert!(arena.get(&id).iter().all(|&b| b == 0));
        assert_eq!(arena.live(), 1);
        Ok(())
    }

    #[test]
    fn recycles_freed_indices() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut arena = ChunkArena::new();
        let a = arena.allocate(8)?;
        let b = arena.allocate(8)?;
        let a_index = a.index();
        arena.get_mut(&a)[0] = 0xff;
        arena.free(a);
        assert_eq!(arena.live(), 1);

        let c = arena.allocate(4)?;
        assert_eq!(c.index(), a_index);
        assert_eq!(arena.get(&c), &[0u8; 4][..]);
        assert_eq!(arena.get(&b).len(), 8);
        Ok(())
    }

    #[test]
    fn oversized_allocation_is_out_of_memory() {
        let mut arena = ChunkArena::new();
        let res = arena.allocate(usize::MAX);
        assert_eq!(res, Err(crate::errors::MmindError::OutOfMemory));
        assert_eq!(arena.live(), 0);
    }
}
