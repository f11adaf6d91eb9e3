use super::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use crate::config::PoolOptions;
use bytes::BytesMut;

/// Growable buffers: returned buffers are emptied, and undersized ones are
/// grown to `buf_size` instead of discarded so later writes skip the regrow.
#[derive(Debug, Clone, Copy)]
pub struct BufferPolicy {
    buf_size: usize,
    max_buf_size: usize,
}

impl BufferPolicy {
    pub fn new(buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            buf_size,
            max_buf_size: options.max_buf_size(buf_size),
        }
    }
}

impl Policy<BytesMut> for BufferPolicy {
    fn allocate(&self) -> BytesMut {
        BytesMut::with_capacity(self.buf_size)
    }

    fn admit(&self, mut buf: BytesMut) -> Option<BytesMut> {
        if self.max_buf_size < buf.capacity() {
            return None;
        }
        buf.clear();
        if buf.capacity() < self.buf_size {
            buf.reserve(self.buf_size);
        }
        Some(buf)
    }

    fn nominal_size(&self) -> usize {
        self.buf_size
    }
}

pub struct BufferPool {
    pool: BoundedPool<BytesMut, BufferPolicy>,
}

impl BufferPool {
    pub fn new(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BoundedPool::new(capacity, BufferPolicy::new(buf_size, options), options),
        }
    }

    #[inline]
    pub fn get(&self) -> BytesMut {
        self.pool.get()
    }

    pub fn get_ref(&self) -> Ref<'_, BytesMut> {
        Ref::pooled(self.get(), self)
    }

    #[inline]
    pub fn put(&self, buf: BytesMut) -> bool {
        self.pool.put(buf)
    }

    pub fn buf_size(&self) -> usize {
        self.pool.policy().buf_size
    }

    pub fn max_buf_size(&self) -> usize {
        self.pool.policy().max_buf_size
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

impl Recycle<BytesMut> for BufferPool {
    fn put(&self, buf: BytesMut) -> bool {
        BufferPool::put(self, buf)
    }
}

impl PoolSize for BufferPool {
    fn len(&self) -> usize {
        BufferPool::len(self)
    }

    fn cap(&self) -> usize {
        BufferPool::cap(self)
    }
}
