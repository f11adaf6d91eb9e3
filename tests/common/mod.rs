#![allow(dead_code)]

pub mod concurrent;

use lightning_pool::PoolOptions;

pub fn default_options() -> PoolOptions {
    PoolOptions::default()
}

pub fn preload_options(rate: f64) -> PoolOptions {
    PoolOptions::new().with_preload(true).with_preload_rate(rate)
}

/// Deterministic non-zero pattern for filling buffers.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) | 1).collect()
}
