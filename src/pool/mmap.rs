//! Byte pool backed by anonymous private mappings.
//!
//! Buffers live outside the allocator's heap. Each buffer's capacity is the
//! pool's alignment size; only buffers of exactly that capacity are admitted.
//! A discarded buffer is unmapped as soon as it is dropped.

use super::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use crate::config::PoolOptions;
use memmap2::MmapMut;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::warn;

pub const DEFAULT_MMAP_ALIGNMENT: usize = 8;

/// Round `size` past the next multiple of `align`: `((size + align) / align) * align`.
#[inline]
pub fn mmap_align(size: usize, align: usize) -> usize {
    let align = align.max(1);
    ((size + align) / align) * align
}

#[inline]
pub fn default_mmap_align(size: usize) -> usize {
    mmap_align(size, DEFAULT_MMAP_ALIGNMENT)
}

enum Backing {
    Mapped(MmapMut),
    Heap(Box<[u8]>),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Mapped(map) => map,
            Backing::Heap(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Backing::Mapped(map) => map,
            Backing::Heap(buf) => buf,
        }
    }
}

/// A byte buffer with a fixed capacity and an adjustable length.
///
/// All `capacity()` bytes are always initialized (mappings are zero-filled),
/// so changing the length never exposes uninitialized memory.
pub struct MmapBuffer {
    backing: Backing,
    len: usize,
}

impl MmapBuffer {
    /// Map `capacity` bytes, falling back to a heap allocation if the mapping fails.
    pub fn map(capacity: usize, len: usize) -> Self {
        let backing = match MmapMut::map_anon(capacity) {
            Ok(map) => Backing::Mapped(map),
            Err(e) => {
                warn!(capacity, error = %e, "anonymous mapping failed, falling back to heap");
                Backing::Heap(vec![0u8; capacity].into_boxed_slice())
            }
        };
        Self {
            backing,
            len: len.min(capacity),
        }
    }

    /// Heap-backed buffer, used for unpooled fallbacks.
    pub fn heap(capacity: usize, len: usize) -> Self {
        Self {
            backing: Backing::Heap(vec![0u8; capacity].into_boxed_slice()),
            len: len.min(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.backing.as_slice().len()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    /// Set the visible length, clamped to the capacity.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity());
    }

    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }
}

impl Deref for MmapBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.backing.as_slice()[..self.len]
    }
}

impl DerefMut for MmapBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut self.backing.as_mut_slice()[..len]
    }
}

impl fmt::Debug for MmapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MmapPolicy {
    buf_size: usize,
    align_size: usize,
}

impl MmapPolicy {
    pub fn new(buf_size: usize) -> Self {
        Self {
            buf_size,
            align_size: default_mmap_align(buf_size),
        }
    }
}

impl Policy<MmapBuffer> for MmapPolicy {
    fn allocate(&self) -> MmapBuffer {
        MmapBuffer::map(self.align_size, self.buf_size)
    }

    fn admit(&self, mut buf: MmapBuffer) -> Option<MmapBuffer> {
        // A mapping cannot be resized cheaply: exact capacity or drop (unmap).
        if buf.capacity() != self.align_size {
            return None;
        }
        buf.set_len(self.buf_size);
        Some(buf)
    }

    fn nominal_size(&self) -> usize {
        self.buf_size
    }
}

pub struct MmapBytePool {
    pool: BoundedPool<MmapBuffer, MmapPolicy>,
}

impl MmapBytePool {
    pub fn new(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BoundedPool::new(capacity, MmapPolicy::new(buf_size), options),
        }
    }

    #[inline]
    pub fn get(&self) -> MmapBuffer {
        self.pool.get()
    }

    pub fn get_ref(&self) -> Ref<'_, MmapBuffer> {
        Ref::pooled(self.get(), self)
    }

    /// Offer a buffer back. Rejected buffers, and buffers that do not fit in a
    /// full pool, are unmapped before this returns.
    #[inline]
    pub fn put(&self, buf: MmapBuffer) -> bool {
        self.pool.put(buf)
    }

    pub fn buf_size(&self) -> usize {
        self.pool.policy().buf_size
    }

    pub fn align_size(&self) -> usize {
        self.pool.policy().align_size
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn cap(&self) -> usize {
        self.pool.cap()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl Recycle<MmapBuffer> for MmapBytePool {
    fn put(&self, buf: MmapBuffer) -> bool {
        MmapBytePool::put(self, buf)
    }
}

impl PoolSize for MmapBytePool {
    fn len(&self) -> usize {
        MmapBytePool::len(self)
    }

    fn cap(&self) -> usize {
        MmapBytePool::cap(self)
    }
}
