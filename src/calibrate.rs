//! Calibration hooks invoked on pool events.
//!
//! Hooks are a side channel for instrumentation and adaptive tuning; they never
//! influence admission or allocation. The default is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_CALL_MOD: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEvent {
    /// `get` found the queue empty and allocated
    Miss,
    /// `put` was called, whether or not the object was kept
    Put,
    /// Construction-time prefill finished
    Preload,
}

/// Point-in-time view of a pool handed to calibrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub len: usize,
    pub cap: usize,
    pub buf_size: usize,
}

impl PoolSnapshot {
    pub fn fill_rate(&self) -> f64 {
        if self.cap == 0 {
            0.0
        } else {
            self.len as f64 / self.cap as f64
        }
    }
}

pub trait CalibrateHandler: Send + Sync {
    fn calibrate(&self, event: PoolEvent, snapshot: PoolSnapshot);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCalibrator;

impl CalibrateHandler for NoopCalibrator {
    #[inline(always)]
    fn calibrate(&self, _event: PoolEvent, _snapshot: PoolSnapshot) {}
}

/// Forwards every `call_mod`-th call to the wrapped handler, starting with the first.
pub struct IntervalCalibrator<H> {
    inner: H,
    call_mod: u64,
    counter: AtomicU64,
}

impl<H: CalibrateHandler> IntervalCalibrator<H> {
    pub fn new(inner: H) -> Self {
        Self::with_call_mod(inner, DEFAULT_CALL_MOD)
    }

    pub fn with_call_mod(inner: H, call_mod: u64) -> Self {
        Self {
            inner,
            call_mod: call_mod.max(1),
            counter: AtomicU64::new(0),
        }
    }

    fn incr_and_run(&self) -> bool {
        let value = self.counter.fetch_add(1, Ordering::Relaxed);
        value % self.call_mod == 0
    }
}

impl<H: CalibrateHandler> CalibrateHandler for IntervalCalibrator<H> {
    fn calibrate(&self, event: PoolEvent, snapshot: PoolSnapshot) {
        if self.incr_and_run() {
            self.inner.calibrate(event, snapshot);
        }
    }
}

/// Reports pools whose fill rate drops below `util_rate` when they miss.
#[derive(Debug)]
pub struct CapacityFillRate {
    util_rate: f64,
    low_fill_misses: AtomicU64,
}

impl CapacityFillRate {
    pub fn new(util_rate: f64) -> Self {
        Self {
            util_rate,
            low_fill_misses: AtomicU64::new(0),
        }
    }

    /// Misses observed while the pool was under the configured fill rate.
    pub fn low_fill_misses(&self) -> u64 {
        self.low_fill_misses.load(Ordering::Relaxed)
    }
}

impl CalibrateHandler for CapacityFillRate {
    fn calibrate(&self, event: PoolEvent, snapshot: PoolSnapshot) {
        if event != PoolEvent::Miss {
            return;
        }
        let fill = snapshot.fill_rate();
        if fill < self.util_rate {
            self.low_fill_misses.fetch_add(1, Ordering::Relaxed);
            debug!(
                fill_rate = fill,
                target_rate = self.util_rate,
                len = snapshot.len,
                cap = snapshot.cap,
                buf_size = snapshot.buf_size,
                "pool below target fill rate on miss"
            );
        }
    }
}

impl<H: CalibrateHandler + ?Sized> CalibrateHandler for Arc<H> {
    fn calibrate(&self, event: PoolEvent, snapshot: PoolSnapshot) {
        (**self).calibrate(event, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicU64,
    }

    impl CalibrateHandler for Counting {
        fn calibrate(&self, _event: PoolEvent, _snapshot: PoolSnapshot) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(len: usize, cap: usize) -> PoolSnapshot {
        PoolSnapshot { len, cap, buf_size: 8 }
    }

    #[test]
    fn test_interval_calibrator() {
        let counting = Arc::new(Counting::default());
        let interval = IntervalCalibrator::with_call_mod(Arc::clone(&counting), 10);

        for _ in 0..25 {
            interval.calibrate(PoolEvent::Put, snapshot(0, 4));
        }
        // calls 1, 11, 21
        assert_eq!(counting.calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_capacity_fill_rate() {
        let calibrator = CapacityFillRate::new(0.5);
        calibrator.calibrate(PoolEvent::Miss, snapshot(1, 10));
        calibrator.calibrate(PoolEvent::Miss, snapshot(8, 10));
        calibrator.calibrate(PoolEvent::Put, snapshot(0, 10));
        assert_eq!(calibrator.low_fill_misses(), 1);
    }

    #[test]
    fn test_fill_rate_zero_cap() {
        assert_eq!(snapshot(0, 0).fill_rate(), 0.0);
        assert_eq!(snapshot(3, 12).fill_rate(), 0.25);
    }
}
