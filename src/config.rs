//! Construction-time options shared by every pool kind.
//!
//! Options are plain data so they can be loaded from JSON alongside the rest of
//! a service's configuration. The calibration hook is runtime-only and skipped
//! by serde.

use crate::calibrate::{CalibrateHandler, NoopCalibrator};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_PRELOAD: bool = false;
pub const DEFAULT_PRELOAD_RATE: f64 = 0.25;
pub const DEFAULT_MAX_BUF_SIZE_FACTOR: f64 = 1.25;
pub const DEFAULT_STRICT_SIZE: bool = false;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Prefill the pool during construction
    pub preload: bool,
    /// Fraction of capacity to prefill, clamped to `[0, 1]`
    pub preload_rate: f64,
    /// Returned objects larger than `factor * buf_size` are discarded
    pub max_buf_size_factor: f64,
    /// Stream pools only: admit buffers of exactly `buf_size`
    pub strict_size: bool,
    #[serde(skip)]
    pub calibrator: Option<Arc<dyn CalibrateHandler>>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            preload: DEFAULT_PRELOAD,
            preload_rate: DEFAULT_PRELOAD_RATE,
            max_buf_size_factor: DEFAULT_MAX_BUF_SIZE_FACTOR,
            strict_size: DEFAULT_STRICT_SIZE,
            calibrator: None,
        }
    }
}

impl fmt::Debug for PoolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolOptions")
            .field("preload", &self.preload)
            .field("preload_rate", &self.preload_rate)
            .field("max_buf_size_factor", &self.max_buf_size_factor)
            .field("strict_size", &self.strict_size)
            .field("calibrator", &self.calibrator.is_some())
            .finish()
    }
}

impl PoolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: PoolOptions = serde_json::from_str(json)?;
        Ok(options)
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_preload(mut self, enable: bool) -> Self {
        self.preload = enable;
        self
    }

    pub fn with_preload_rate(mut self, rate: f64) -> Self {
        self.preload_rate = rate;
        self
    }

    pub fn with_max_buf_size_factor(mut self, factor: f64) -> Self {
        self.max_buf_size_factor = factor;
        self
    }

    pub fn with_strict_size(mut self, strict: bool) -> Self {
        self.strict_size = strict;
        self
    }

    pub fn with_calibrator(mut self, calibrator: Arc<dyn CalibrateHandler>) -> Self {
        self.calibrator = Some(calibrator);
        self
    }

    /// Number of objects to prefill for a pool of `capacity`, zero when preload is off.
    pub fn preload_count(&self, capacity: usize) -> usize {
        if !self.preload || capacity == 0 {
            return 0;
        }
        let rate = if self.preload_rate.is_nan() {
            0.0
        } else {
            self.preload_rate.clamp(0.0, 1.0)
        };
        (capacity as f64 * rate) as usize
    }

    /// Upper admission bound for a pool of nominal size `buf_size`.
    pub fn max_buf_size(&self, buf_size: usize) -> usize {
        let max = (self.max_buf_size_factor * buf_size as f64) as usize;
        if max < 1 {
            buf_size
        } else {
            max
        }
    }

    pub(crate) fn calibrator(&self) -> Arc<dyn CalibrateHandler> {
        match &self.calibrator {
            Some(calibrator) => Arc::clone(calibrator),
            None => Arc::new(NoopCalibrator),
        }
    }
}
