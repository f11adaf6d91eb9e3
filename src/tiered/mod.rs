//! Size-tiered routers over several same-kind pools.
//!
//! A router owns one pool per bucket, sorted ascending by bucket size. A
//! request goes to the first bucket at least as large as the requested size;
//! requests larger than every bucket get an unpooled allocation.

mod buffer;
mod byte;
mod mmap;

pub use buffer::MultiBufferPool;
pub use byte::MultiBytePool;
pub use mmap::MultiMmapBytePool;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One bucket request: `capacity` pooled objects of `buf_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSize {
    pub capacity: usize,
    pub buf_size: usize,
}

impl TierSize {
    pub const fn new(capacity: usize, buf_size: usize) -> Self {
        Self { capacity, buf_size }
    }
}

/// Shorthand for [`TierSize::new`].
pub const fn tier(capacity: usize, buf_size: usize) -> TierSize {
    TierSize::new(capacity, buf_size)
}

/// Buckets sorted by key. Later sizes with an equal key replace earlier ones.
pub(crate) struct Tiers<P> {
    buckets: Vec<(usize, TierSize, P)>,
}

impl<P> Tiers<P> {
    pub(crate) fn build(
        sizes: &[TierSize],
        key: impl Fn(&TierSize) -> usize,
        mut make: impl FnMut(&TierSize) -> P,
    ) -> Self {
        let mut uniq = BTreeMap::new();
        for size in sizes {
            uniq.insert(key(size), *size);
        }
        let buckets = uniq
            .into_iter()
            .map(|(k, size)| (k, size, make(&size)))
            .collect();
        Self { buckets }
    }

    /// First bucket whose key is at least `size`.
    #[inline]
    pub(crate) fn find(&self, size: usize) -> Option<&P> {
        self.buckets
            .iter()
            .find(|(key, _, _)| size <= *key)
            .map(|(_, _, pool)| pool)
    }

    pub(crate) fn sizes(&self) -> Vec<TierSize> {
        self.buckets.iter().map(|(_, size, _)| *size).collect()
    }

    pub(crate) fn pools(&self) -> impl Iterator<Item = &P> {
        self.buckets.iter().map(|(_, _, pool)| pool)
    }
}
