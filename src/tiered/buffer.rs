use super::{TierSize, Tiers};
use crate::config::PoolOptions;
use crate::pool::{BufferPool, PoolStats, Ref};
use bytes::BytesMut;

/// Routes growable buffers to the smallest fitting [`BufferPool`].
pub struct MultiBufferPool {
    tiers: Tiers<BufferPool>,
}

impl MultiBufferPool {
    pub fn new(sizes: &[TierSize], options: &PoolOptions) -> Self {
        Self {
            tiers: Tiers::build(sizes, |t| t.buf_size, |t| {
                BufferPool::new(t.capacity, t.buf_size, options)
            }),
        }
    }

    /// An empty buffer with capacity of at least `size`.
    pub fn get(&self, size: usize) -> BytesMut {
        match self.tiers.find(size) {
            Some(pool) => pool.get(),
            None => BytesMut::with_capacity(size),
        }
    }

    pub fn get_ref(&self, size: usize) -> Ref<'_, BytesMut> {
        match self.tiers.find(size) {
            Some(pool) => Ref::pooled(pool.get(), pool),
            None => Ref::unpooled(BytesMut::with_capacity(size)),
        }
    }

    pub fn put(&self, buf: BytesMut) -> bool {
        match self.tiers.find(buf.capacity()) {
            Some(pool) => pool.put(buf),
            None => false,
        }
    }

    pub fn sizes(&self) -> Vec<TierSize> {
        self.tiers.sizes()
    }

    pub fn find(&self, size: usize) -> Option<&BufferPool> {
        self.tiers.find(size)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.tiers.pools().map(BufferPool::stats).collect()
    }
}
