//! Pools of reusable Tokio timers.
//!
//! Each `Ticker` and `Timer` owns one boxed `Sleep`, so a checkout resets an
//! existing timer entry instead of registering a new one. Both types must be
//! created inside a Tokio runtime. Pooled timers are parked on a distant
//! deadline; timer pools never preload.

use super::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use crate::config::PoolOptions;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Instant, Sleep};

// Deadline offset for timers sitting in a pool.
const PARKED: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic timer. The first tick completes one period after `new`/`reset`.
#[derive(Debug)]
pub struct Ticker {
    sleep: Pin<Box<Sleep>>,
    period: Duration,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            sleep: Box::pin(sleep(period)),
            period,
        }
    }

    pub fn reset(&mut self, period: Duration) {
        self.period = period;
        self.sleep.as_mut().reset(Instant::now() + period);
    }

    /// Wait for the next tick. Ticks missed by a slow consumer are skipped.
    pub async fn tick(&mut self) -> Instant {
        self.sleep.as_mut().await;
        let fired = self.sleep.deadline();
        let now = Instant::now();
        let mut next = fired + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.sleep.as_mut().reset(next);
        fired
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn park(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + PARKED);
    }
}

/// One-shot timer.
#[derive(Debug)]
pub struct Timer {
    sleep: Pin<Box<Sleep>>,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            sleep: Box::pin(sleep(duration)),
        }
    }

    pub fn reset(&mut self, duration: Duration) {
        self.sleep.as_mut().reset(Instant::now() + duration);
    }

    /// Completes once the deadline is reached; returns immediately afterwards.
    pub async fn wait(&mut self) {
        self.sleep.as_mut().await;
    }

    pub fn deadline(&self) -> Instant {
        self.sleep.deadline()
    }

    pub fn is_elapsed(&self) -> bool {
        self.sleep.is_elapsed()
    }

    fn park(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + PARKED);
    }
}

struct TickerPolicy;

impl Policy<Ticker> for TickerPolicy {
    fn allocate(&self) -> Ticker {
        Ticker::new(PARKED)
    }

    fn admit(&self, mut ticker: Ticker) -> Option<Ticker> {
        ticker.park();
        Some(ticker)
    }

    fn nominal_size(&self) -> usize {
        0
    }
}

struct TimerPolicy;

impl Policy<Timer> for TimerPolicy {
    fn allocate(&self) -> Timer {
        Timer::new(PARKED)
    }

    fn admit(&self, mut timer: Timer) -> Option<Timer> {
        timer.park();
        Some(timer)
    }

    fn nominal_size(&self) -> usize {
        0
    }
}

fn without_preload(options: &PoolOptions) -> PoolOptions {
    options.clone().with_preload(false)
}

pub struct TickerPool {
    pool: BoundedPool<Ticker, TickerPolicy>,
}

impl TickerPool {
    pub fn new(capacity: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BoundedPool::new(capacity, TickerPolicy, &without_preload(options)),
        }
    }

    /// Reuse a pooled ticker reset to `period`, or create one.
    pub fn get(&self, period: Duration) -> Ticker {
        match self.pool.take() {
            Some(mut ticker) => {
                ticker.reset(period);
                ticker
            }
            None => Ticker::new(period),
        }
    }

    pub fn get_ref(&self, period: Duration) -> Ref<'_, Ticker> {
        Ref::pooled(self.get(period), self)
    }

    pub fn put(&self, ticker: Ticker) -> bool {
        self.pool.put(ticker)
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

impl Recycle<Ticker> for TickerPool {
    fn put(&self, ticker: Ticker) -> bool {
        TickerPool::put(self, ticker)
    }
}

impl PoolSize for TickerPool {
    fn len(&self) -> usize {
        TickerPool::len(self)
    }

    fn cap(&self) -> usize {
        TickerPool::cap(self)
    }
}

pub struct TimerPool {
    pool: BoundedPool<Timer, TimerPolicy>,
}

impl TimerPool {
    pub fn new(capacity: usize, options: &PoolOptions) -> Self {
        Self {
            pool: BoundedPool::new(capacity, TimerPolicy, &without_preload(options)),
        }
    }

    /// Reuse a pooled timer reset to `duration`, or create one.
    pub fn get(&self, duration: Duration) -> Timer {
        match self.pool.take() {
            Some(mut timer) => {
                timer.reset(duration);
                timer
            }
            None => Timer::new(duration),
        }
    }

    pub fn get_ref(&self, duration: Duration) -> Ref<'_, Timer> {
        Ref::pooled(self.get(duration), self)
    }

    pub fn put(&self, timer: Timer) -> bool {
        self.pool.put(timer)
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

impl Recycle<Timer> for TimerPool {
    fn put(&self, timer: Timer) -> bool {
        TimerPool::put(self, timer)
    }
}

impl PoolSize for TimerPool {
    fn len(&self) -> usize {
        TimerPool::len(self)
    }

    fn cap(&self) -> usize {
        TimerPool::cap(self)
    }
}
