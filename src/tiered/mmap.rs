use super::{TierSize, Tiers};
use crate::config::PoolOptions;
use crate::pool::{default_mmap_align, MmapBuffer, MmapBytePool, PoolStats, Ref};

/// Routes mapped buffers by alignment size. Sizes that align to the same
/// value share one bucket; the last one listed wins.
pub struct MultiMmapBytePool {
    tiers: Tiers<MmapBytePool>,
}

impl MultiMmapBytePool {
    pub fn new(sizes: &[TierSize], options: &PoolOptions) -> Self {
        Self {
            tiers: Tiers::build(sizes, |t| default_mmap_align(t.buf_size), |t| {
                MmapBytePool::new(t.capacity, t.buf_size, options)
            }),
        }
    }

    pub fn get(&self, size: usize) -> MmapBuffer {
        match self.tiers.find(size) {
            Some(pool) => {
                let mut buf = pool.get();
                buf.set_len(size);
                buf
            }
            None => MmapBuffer::heap(size, size),
        }
    }

    pub fn get_ref(&self, size: usize) -> Ref<'_, MmapBuffer> {
        match self.tiers.find(size) {
            Some(pool) => {
                let mut buf = pool.get();
                buf.set_len(size);
                Ref::pooled(buf, pool)
            }
            None => Ref::unpooled(MmapBuffer::heap(size, size)),
        }
    }

    pub fn put(&self, buf: MmapBuffer) -> bool {
        match self.tiers.find(buf.capacity()) {
            Some(pool) => pool.put(buf),
            None => false,
        }
    }

    pub fn sizes(&self) -> Vec<TierSize> {
        self.tiers.sizes()
    }

    pub fn find(&self, size: usize) -> Option<&MmapBytePool> {
        self.tiers.find(size)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.tiers.pools().map(MmapBytePool::stats).collect()
    }
}
