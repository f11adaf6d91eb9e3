use super::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use crate::config::PoolOptions;

/// Fixed-size byte buffers: every buffer handed out has length `buf_size`.
#[derive(Debug, Clone, Copy)]
pub struct BytePolicy {
    buf_size: usize,
    max_buf_size: usize,
}

impl BytePolicy {
    pub fn new(buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            buf_size,
            max_buf_size: options.max_buf_size(buf_size),
        }
    }

    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    pub fn max_buf_size(&self) -> usize {
        self.max_buf_size
    }
}

impl Policy<Vec<u8>> for BytePolicy {
    fn allocate(&self) -> Vec<u8> {
        vec![0u8; self.buf_size]
    }

    fn admit(&self, mut data: Vec<u8>) -> Option<Vec<u8>> {
        // Oversized buffers are never kept.
        if self.max_buf_size < data.capacity() {
            return None;
        }
        // Neither are undersized ones.
        if data.capacity() < self.buf_size {
            return None;
        }
        data.resize(self.buf_size, 0);
        Some(data)
    }

    fn nominal_size(&self) -> usize {
        self.buf_size
    }
}

pub struct BytePool {
    pool: BoundedPool<Vec<u8>, BytePolicy>,
}

impl BytePool {
    pub fn new(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BoundedPool::new(capacity, BytePolicy::new(buf_size, options), options),
        }
    }

    #[inline]
    pub fn get(&self) -> Vec<u8> {
        self.pool.get()
    }

    pub fn get_ref(&self) -> Ref<'_, Vec<u8>> {
        Ref::pooled(self.get(), self)
    }

    #[inline]
    pub fn put(&self, data: Vec<u8>) -> bool {
        self.pool.put(data)
    }

    pub fn buf_size(&self) -> usize {
        self.pool.policy().buf_size()
    }

    pub fn max_buf_size(&self) -> usize {
        self.pool.policy().max_buf_size()
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

impl Recycle<Vec<u8>> for BytePool {
    fn put(&self, data: Vec<u8>) -> bool {
        BytePool::put(self, data)
    }
}

impl PoolSize for BytePool {
    fn len(&self) -> usize {
        BytePool::len(self)
    }

    fn cap(&self) -> usize {
        BytePool::cap(self)
    }
}
