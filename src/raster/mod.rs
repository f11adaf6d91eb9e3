//! Pixel-raster buffers carved out of pooled byte arrays.
//!
//! A layout turns a rectangle into a stride and plane offsets over one
//! contiguous backing array. Packed formats (RGBA, NRGBA) use four bytes per
//! pixel in a single plane. YCbCr 4:2:0 stores a full-resolution luma plane
//! followed by two quarter-resolution chroma planes.

mod image;
mod multi;
mod pool;

pub use image::{Nrgba, NrgbaImage, PackedImage, PixelFormat, Rgba, RgbaImage, YCbCrImage};
pub use multi::{rect_tier, MultiNrgbaPool, MultiPackedPool, MultiRgbaPool, MultiYCbCrPool, RectTier};
pub use pool::{NrgbaPool, PackedPool, PixPolicy, RgbaPool, YCbCrPool};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open rectangle `[min, max)` in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    /// Build a rectangle from two corners in any order.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// `width x height` rectangle at the origin.
    pub fn with_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn dx(&self) -> usize {
        if self.min_x >= self.max_x {
            return 0;
        }
        self.max_x.abs_diff(self.min_x) as usize
    }

    #[inline]
    pub fn dy(&self) -> usize {
        if self.min_y >= self.max_y {
            return 0;
        }
        self.max_y.abs_diff(self.min_y) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Whether `other` is no wider and no taller than `self`. Origins are ignored.
    pub fn fits(&self, other: &Rect) -> bool {
        other.dx() <= self.dx() && other.dy() <= self.dy()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.min_x <= x && x < self.max_x && self.min_y <= y && y < self.max_y
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsampleRatio {
    Ratio444,
    Ratio422,
    Ratio420,
    Ratio440,
    Ratio411,
    Ratio410,
}

impl fmt::Display for SubsampleRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubsampleRatio::Ratio444 => "4:4:4",
            SubsampleRatio::Ratio422 => "4:2:2",
            SubsampleRatio::Ratio420 => "4:2:0",
            SubsampleRatio::Ratio440 => "4:4:0",
            SubsampleRatio::Ratio411 => "4:1:1",
            SubsampleRatio::Ratio410 => "4:1:0",
        };
        f.write_str(s)
    }
}

pub const BYTES_PER_PIXEL: usize = 4;

/// Single-plane, four bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedLayout {
    pub rect: Rect,
    pub stride: usize,
    pub length: usize,
}

impl PackedLayout {
    pub fn new(rect: Rect) -> Self {
        let stride = rect.dx() * BYTES_PER_PIXEL;
        Self {
            rect,
            stride,
            length: stride * rect.dy(),
        }
    }

    /// Byte offset of pixel `(x, y)`, or `None` outside the rectangle.
    #[inline]
    pub fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        Some(
            y.abs_diff(self.rect.min_y) as usize * self.stride
                + x.abs_diff(self.rect.min_x) as usize * BYTES_PER_PIXEL,
        )
    }
}

/// Planar 4:2:0 layout: `Y = [0, i0)`, `Cb = [i0, i1)`, `Cr = [i1, i2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YCbCrLayout {
    pub rect: Rect,
    pub ratio: SubsampleRatio,
    pub i0: usize,
    pub i1: usize,
    pub i2: usize,
    pub y_stride: usize,
    pub c_stride: usize,
}

impl YCbCrLayout {
    /// Only 4:2:0 is supported; any other ratio is an error.
    pub fn new(rect: Rect, ratio: SubsampleRatio) -> Result<Self> {
        if ratio != SubsampleRatio::Ratio420 {
            return Err(Error::UnsupportedSubsampleRatio(ratio));
        }
        Ok(Self::new_420(rect))
    }

    pub(crate) fn new_420(rect: Rect) -> Self {
        let (w, h) = (rect.dx(), rect.dy());
        let (cw, ch) = chroma_size_420(&rect);
        let i0 = w * h;
        let i1 = i0 + cw * ch;
        let i2 = i0 + 2 * cw * ch;
        Self {
            rect,
            ratio: SubsampleRatio::Ratio420,
            i0,
            i1,
            i2,
            y_stride: w,
            c_stride: cw,
        }
    }

    pub fn length(&self) -> usize {
        self.i2
    }

    #[inline]
    pub fn y_offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        Some(
            y.abs_diff(self.rect.min_y) as usize * self.y_stride
                + x.abs_diff(self.rect.min_x) as usize,
        )
    }

    /// Offset of the chroma sample covering `(x, y)`, relative to the start of a chroma plane.
    #[inline]
    pub fn c_offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let cy = half_floor(y) - half_floor(self.rect.min_y);
        let cx = half_floor(x) - half_floor(self.rect.min_x);
        Some(cy as usize * self.c_stride + cx as usize)
    }
}

#[inline]
fn half_floor(v: i32) -> i64 {
    i64::from(v).div_euclid(2)
}

/// Chroma plane dimensions for 4:2:0, rounded to cover odd edges.
fn chroma_size_420(rect: &Rect) -> (usize, usize) {
    if rect.is_empty() {
        return (0, 0);
    }
    let cw = (i64::from(rect.max_x) + 1).div_euclid(2) - half_floor(rect.min_x);
    let ch = (i64::from(rect.max_y) + 1).div_euclid(2) - half_floor(rect.min_y);
    (cw.max(0) as usize, ch.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_canonical() {
        let r = Rect::new(10, 20, 0, 5);
        assert_eq!(r, Rect::new(0, 5, 10, 20));
        assert_eq!((r.dx(), r.dy()), (10, 15));
        assert_eq!(r.to_string(), "(0,5)-(10,20)");
        assert!(Rect::new(3, 3, 3, 9).is_empty());
    }

    #[test]
    fn test_rect_fits() {
        let bucket = Rect::with_size(640, 360);
        assert!(bucket.fits(&Rect::with_size(640, 360)));
        assert!(bucket.fits(&Rect::new(100, 100, 400, 300)));
        assert!(!bucket.fits(&Rect::with_size(360, 640)));
    }

    #[test]
    fn test_packed_layout() {
        let layout = PackedLayout::new(Rect::with_size(100, 50));
        assert_eq!(layout.stride, 400);
        assert_eq!(layout.length, 100 * 50 * 4);
        assert_eq!(layout.offset(1, 1), Some(404));
        assert_eq!(layout.offset(100, 0), None);
        assert_eq!(layout.offset(0, -1), None);
    }

    #[test]
    fn test_ycbcr_layout_100x100() {
        let layout = YCbCrLayout::new(Rect::with_size(100, 100), SubsampleRatio::Ratio420).unwrap();
        assert_eq!(layout.i0, 10_000);
        assert_eq!(layout.i1, 12_500);
        assert_eq!(layout.i2, 15_000);
        assert_eq!(layout.y_stride, 100);
        assert_eq!(layout.c_stride, 50);
    }

    #[test]
    fn test_ycbcr_odd_edges() {
        let layout = YCbCrLayout::new_420(Rect::new(1, 1, 4, 4));
        // chroma columns 0..2 cover x = 1..4
        assert_eq!(layout.c_stride, 2);
        assert_eq!(layout.i0, 9);
        assert_eq!(layout.i2, 9 + 2 * 4);
        assert_eq!(layout.c_offset(1, 1), Some(0));
        assert_eq!(layout.c_offset(3, 3), Some(3));
        assert_eq!(layout.c_offset(0, 1), None);
        assert_eq!(layout.y_offset(3, 3), Some(8));
        assert_eq!(layout.y_offset(4, 3), None);
    }

    #[test]
    fn test_extreme_coordinates() {
        let wide = Rect::new(-2_000_000_000, 0, 2_000_000_000, 1);
        assert_eq!(wide.dx(), 4_000_000_000);
        assert_eq!(wide.dy(), 1);
        assert_eq!(Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX).dy(), u32::MAX as usize);

        let edge = YCbCrLayout::new(Rect::new(i32::MAX - 2, 0, i32::MAX, 2), SubsampleRatio::Ratio420).unwrap();
        assert_eq!((edge.y_stride, edge.c_stride), (2, 2));
        assert_eq!((edge.i0, edge.i1, edge.i2), (4, 6, 8));
        assert_eq!(edge.c_offset(i32::MAX - 1, 1), Some(1));

        let corner = Rect::new(i32::MIN, i32::MIN, i32::MIN + 2, i32::MIN + 2);
        let layout = YCbCrLayout::new_420(corner);
        assert_eq!(layout.c_stride, 1);
        assert_eq!(layout.c_offset(i32::MIN + 1, i32::MIN + 1), Some(0));
    }

    #[test]
    fn test_ycbcr_rejects_other_ratios() {
        let err = YCbCrLayout::new(Rect::with_size(8, 8), SubsampleRatio::Ratio444).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedSubsampleRatio(SubsampleRatio::Ratio444)
        ));
        assert_eq!(err.error_code(), -2);
    }
}
