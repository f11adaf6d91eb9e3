//! Owning handle that hands its object back exactly once.
//!
//! A `Ref` starts `Open` and moves to `Released` through a single
//! compare-and-swap. The winner of the swap performs the `put`; every later
//! `release`, including the one issued by `Drop`, is a no-op. Dropping an open
//! handle releases it, so a forgotten release never leaks the object.

use super::Recycle;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const REF_OPEN: u8 = 0;
const REF_RELEASED: u8 = 1;

pub struct Ref<'p, T> {
    value: Option<T>,
    // `None` for unpooled fallbacks that can never be re-admitted.
    pool: Option<&'p dyn Recycle<T>>,
    state: AtomicU8,
}

impl<'p, T> Ref<'p, T> {
    pub(crate) fn pooled(value: T, pool: &'p dyn Recycle<T>) -> Self {
        Self {
            value: Some(value),
            pool: Some(pool),
            state: AtomicU8::new(REF_OPEN),
        }
    }

    pub(crate) fn unpooled(value: T) -> Self {
        Self {
            value: Some(value),
            pool: None,
            state: AtomicU8::new(REF_OPEN),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == REF_RELEASED
    }

    /// Whether releasing this handle can return the object to a pool.
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    fn close(&self) -> bool {
        self.state
            .compare_exchange(REF_OPEN, REF_RELEASED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Return the object to its pool. Only the first call has any effect; it
    /// returns whether the pool kept the object.
    pub fn release(&mut self) -> bool {
        if !self.close() {
            return false;
        }
        match (self.value.take(), self.pool) {
            (Some(value), Some(pool)) => pool.put(value),
            _ => false,
        }
    }

    /// Close the handle and keep the object instead of returning it.
    pub fn detach(mut self) -> Option<T> {
        if self.close() {
            self.value.take()
        } else {
            None
        }
    }
}

impl<T> Drop for Ref<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.value)
            .field("pooled", &self.pool.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}
