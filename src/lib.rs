//! Fixed-capacity object-reuse pools.
//!
//! Callers borrow an object with `get` (or an owning [`Ref`] with `get_ref`),
//! use it, and hand it back with `put` (or by releasing/dropping the `Ref`).
//! Pools never block: an empty pool allocates and a full pool drops. Each pool
//! kind decides on `put` whether a returned object is fit to keep.

pub mod calibrate;
pub mod config;
pub mod copy;
pub mod error;
pub mod pool;
pub mod raster;
pub mod tiered;

pub use calibrate::{
    CalibrateHandler, CapacityFillRate, IntervalCalibrator, NoopCalibrator, PoolEvent, PoolSnapshot,
};
pub use config::PoolOptions;
pub use copy::{copy, read_all, CopyIoPool};
pub use error::{Error, Result};
pub use pool::{
    BoundedPool, BufferPool, BufferedReader, BufferedWriter, BufioReaderPool, BufioWriterPool,
    BytePool, MmapBuffer, MmapBytePool, Policy, PoolSize, PoolStats, Recycle, Ref, Ticker,
    TickerPool, Timer, TimerPool,
};
pub use raster::{
    MultiNrgbaPool, MultiRgbaPool, MultiYCbCrPool, NrgbaImage, NrgbaPool, Rect, RgbaImage,
    RgbaPool, SubsampleRatio, YCbCrImage, YCbCrPool,
};
pub use tiered::{tier, MultiBufferPool, MultiBytePool, MultiMmapBytePool, TierSize};
