use super::{TierSize, Tiers};
use crate::config::PoolOptions;
use crate::pool::{BytePool, PoolStats, Ref};

/// Routes fixed-length byte buffers to the smallest fitting [`BytePool`].
pub struct MultiBytePool {
    tiers: Tiers<BytePool>,
}

impl MultiBytePool {
    pub fn new(sizes: &[TierSize], options: &PoolOptions) -> Self {
        Self {
            tiers: Tiers::build(sizes, |t| t.buf_size, |t| {
                BytePool::new(t.capacity, t.buf_size, options)
            }),
        }
    }

    /// A buffer of length `size`. Its capacity is the bucket's `buf_size`,
    /// or exactly `size` when no bucket is large enough.
    pub fn get(&self, size: usize) -> Vec<u8> {
        match self.tiers.find(size) {
            Some(pool) => {
                let mut data = pool.get();
                data.truncate(size);
                data
            }
            None => vec![0u8; size],
        }
    }

    pub fn get_ref(&self, size: usize) -> Ref<'_, Vec<u8>> {
        match self.tiers.find(size) {
            Some(pool) => {
                let mut data = pool.get();
                data.truncate(size);
                Ref::pooled(data, pool)
            }
            None => Ref::unpooled(vec![0u8; size]),
        }
    }

    /// Route by capacity. Buffers larger than every bucket are discarded.
    pub fn put(&self, data: Vec<u8>) -> bool {
        match self.tiers.find(data.capacity()) {
            Some(pool) => pool.put(data),
            None => false,
        }
    }

    pub fn sizes(&self) -> Vec<TierSize> {
        self.tiers.sizes()
    }

    pub fn find(&self, size: usize) -> Option<&BytePool> {
        self.tiers.find(size)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.tiers.pools().map(BytePool::stats).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiered::tier;

    fn router() -> MultiBytePool {
        MultiBytePool::new(&[tier(10, 8), tier(10, 4), tier(10, 16)], &PoolOptions::default())
    }

    #[test]
    fn test_sorted_buckets() {
        let sizes: Vec<usize> = router().sizes().iter().map(|t| t.buf_size).collect();
        assert_eq!(sizes, vec![4, 8, 16]);
    }

    #[test]
    fn test_get_picks_smallest_fit() {
        let pool = router();

        let data = pool.get(5);
        assert_eq!(data.len(), 5);
        assert_eq!(data.capacity(), 8);
        assert!(pool.put(data));
        assert_eq!(pool.find(8).map(BytePool::len), Some(1));

        let data = pool.get(3);
        assert_eq!(data.capacity(), 4);
        assert!(pool.put(data));
        assert_eq!(pool.find(4).map(BytePool::len), Some(1));
    }

    #[test]
    fn test_oversize_is_never_admitted() {
        let pool = router();
        let data = pool.get(1024);
        assert_eq!(data.len(), 1024);
        assert!(!pool.put(data));

        let mut r = pool.get_ref(1024);
        assert!(!r.is_pooled());
        assert!(!r.release());
        assert!(pool.stats().iter().all(|s| s.size == 0));
    }

    #[test]
    fn test_get_ref_returns_to_bucket() {
        let pool = router();
        {
            let r = pool.get_ref(12);
            assert_eq!(r.get().map(Vec::len), Some(12));
        }
        assert_eq!(pool.find(16).map(BytePool::len), Some(1));
    }
}
