//! Bounded, non-blocking object pools.
//!
//! Every concrete pool is a [`BoundedPool`] parameterized by a [`Policy`] that
//! owns the allocation primitive and the admission predicate. The queue is a
//! lock-free `ArrayQueue`: `get` never waits (an empty pool allocates) and
//! `put` never waits (a full pool drops the object).

mod buffer;
mod byte;
mod mmap;
pub mod reference;
mod stream;
mod timer;

pub use buffer::{BufferPolicy, BufferPool};
pub use byte::{BytePolicy, BytePool};
pub use mmap::{default_mmap_align, mmap_align, MmapBuffer, MmapBytePool, MmapPolicy, DEFAULT_MMAP_ALIGNMENT};
pub use reference::Ref;
pub use stream::{
    BufferedReader, BufferedWriter, BufioReaderPool, BufioWriterPool, StreamPolicy,
    DEFAULT_BUFIO_SIZE,
};
pub use timer::{Ticker, TickerPool, Timer, TimerPool};

use crate::calibrate::{CalibrateHandler, PoolEvent, PoolSnapshot};
use crate::config::PoolOptions;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Allocation primitive and admission predicate for one pool kind.
pub trait Policy<T>: Send + Sync {
    /// Create a fresh object of nominal size.
    fn allocate(&self) -> T;

    /// Reset `value` for reuse, or return `None` to discard it.
    fn admit(&self, value: T) -> Option<T>;

    fn nominal_size(&self) -> usize;
}

/// Anything an owning [`Ref`] can hand its object back to.
pub trait Recycle<T>: Send + Sync {
    fn put(&self, value: T) -> bool;
}

/// Observable occupancy, for tests and instrumentation only.
pub trait PoolSize {
    fn len(&self) -> usize;
    fn cap(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicUsize,
    misses: AtomicUsize,
    returns: AtomicUsize,
    discards: AtomicUsize,
    drops: AtomicUsize,
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects currently queued
    pub size: usize,
    pub capacity: usize,
    /// `get` served from the queue
    pub hits: usize,
    /// `get` allocated fresh
    pub misses: usize,
    /// `put` kept the object
    pub returns: usize,
    /// `put` rejected by the admission predicate
    pub discards: usize,
    /// `put` admitted but the queue was full
    pub drops: usize,
}

impl PoolStats {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct BoundedPool<T, P> {
    // `ArrayQueue` rejects zero capacity; a zero-capacity pool keeps nothing.
    queue: Option<ArrayQueue<T>>,
    policy: P,
    calibrator: Arc<dyn CalibrateHandler>,
    counters: Counters,
}

impl<T, P: Policy<T>> BoundedPool<T, P> {
    pub fn new(capacity: usize, policy: P, options: &PoolOptions) -> Self {
        let pool = Self {
            queue: (capacity > 0).then(|| ArrayQueue::new(capacity)),
            policy,
            calibrator: options.calibrator(),
            counters: Counters::default(),
        };

        let preload = options.preload_count(capacity);
        if preload > 0 {
            pool.preload(preload);
        }
        pool
    }

    fn preload(&self, count: usize) {
        let Some(queue) = &self.queue else {
            return;
        };
        for _ in 0..count {
            if let Some(value) = self.policy.admit(self.policy.allocate()) {
                if queue.push(value).is_err() {
                    break;
                }
            }
        }
        debug!(
            preloaded = queue.len(),
            capacity = queue.capacity(),
            buf_size = self.policy.nominal_size(),
            "pool preloaded"
        );
        self.calibrator.calibrate(PoolEvent::Preload, self.snapshot());
    }

    /// Get a pooled object, or allocate a new one.
    #[inline]
    pub fn get(&self) -> T {
        match self.take() {
            Some(value) => value,
            None => self.policy.allocate(),
        }
    }

    /// Pop a pooled object without allocating on a miss.
    pub(crate) fn take(&self) -> Option<T> {
        match self.queue.as_ref().and_then(ArrayQueue::pop) {
            Some(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.calibrator.calibrate(PoolEvent::Miss, self.snapshot());
                None
            }
        }
    }

    /// Offer an object back to the pool. Returns whether it was kept.
    #[inline]
    pub fn put(&self, value: T) -> bool {
        let kept = match self.policy.admit(value) {
            None => {
                self.counters.discards.fetch_add(1, Ordering::Relaxed);
                trace!(buf_size = self.policy.nominal_size(), "put rejected by admission");
                false
            }
            Some(value) => {
                let pushed = match &self.queue {
                    Some(queue) => queue.push(value).is_ok(),
                    None => false,
                };
                if pushed {
                    self.counters.returns.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.counters.drops.fetch_add(1, Ordering::Relaxed);
                    trace!(buf_size = self.policy.nominal_size(), "pool full, object dropped");
                }
                pushed
            }
        };
        self.calibrator.calibrate(PoolEvent::Put, self.snapshot());
        kept
    }

    pub fn len(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::len)
    }

    pub fn cap(&self) -> usize {
        self.queue.as_ref().map_or(0, ArrayQueue::capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            len: self.len(),
            cap: self.cap(),
            buf_size: self.policy.nominal_size(),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.len(),
            capacity: self.cap(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            returns: self.counters.returns.load(Ordering::Relaxed),
            discards: self.counters.discards.load(Ordering::Relaxed),
            drops: self.counters.drops.load(Ordering::Relaxed),
        }
    }
}

impl<T: Send, P: Policy<T>> BoundedPool<T, P> {
    pub fn get_ref(&self) -> Ref<'_, T> {
        Ref::pooled(self.get(), self)
    }
}

impl<T: Send, P: Policy<T>> Recycle<T> for BoundedPool<T, P> {
    fn put(&self, value: T) -> bool {
        BoundedPool::put(self, value)
    }
}

impl<T, P: Policy<T>> PoolSize for BoundedPool<T, P> {
    fn len(&self) -> usize {
        BoundedPool::len(self)
    }

    fn cap(&self) -> usize {
        BoundedPool::cap(self)
    }
}
