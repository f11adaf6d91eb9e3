use super::{PackedLayout, Rect, SubsampleRatio, YCbCrLayout, BYTES_PER_PIXEL};
use std::fmt;
use std::marker::PhantomData;

/// Channel interpretation of a packed four-byte pixel.
pub trait PixelFormat: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Alpha-premultiplied RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba;

/// Non-premultiplied RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nrgba;

impl PixelFormat for Rgba {
    const NAME: &'static str = "RGBA";
}

impl PixelFormat for Nrgba {
    const NAME: &'static str = "NRGBA";
}

/// Packed image over a backing array that may be longer than the image.
#[derive(Clone)]
pub struct PackedImage<M> {
    pix: Vec<u8>,
    layout: PackedLayout,
    _format: PhantomData<M>,
}

pub type RgbaImage = PackedImage<Rgba>;
pub type NrgbaImage = PackedImage<Nrgba>;

impl<M: PixelFormat> PackedImage<M> {
    /// Unpooled image with a backing array sized exactly to `rect`.
    pub fn new(rect: Rect) -> Self {
        let layout = PackedLayout::new(rect);
        Self::from_pix(vec![0u8; layout.length], rect)
    }

    /// Lay `rect` out over `pix`, growing `pix` if it is too short.
    pub fn from_pix(mut pix: Vec<u8>, rect: Rect) -> Self {
        let layout = PackedLayout::new(rect);
        if pix.len() < layout.length {
            pix.resize(layout.length, 0);
        }
        Self {
            pix,
            layout,
            _format: PhantomData,
        }
    }

    pub fn rect(&self) -> Rect {
        self.layout.rect
    }

    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    pub fn layout(&self) -> &PackedLayout {
        &self.layout
    }

    /// Pixel bytes of this image: a prefix of the backing array.
    pub fn pix(&self) -> &[u8] {
        &self.pix[..self.layout.length]
    }

    pub fn pix_mut(&mut self) -> &mut [u8] {
        let length = self.layout.length;
        &mut self.pix[..length]
    }

    /// Byte offset of pixel `(x, y)`, or `None` outside the rectangle.
    pub fn pix_offset(&self, x: i32, y: i32) -> Option<usize> {
        self.layout.offset(x, y)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let i = self.pix_offset(x, y)?;
        let mut px = [0u8; BYTES_PER_PIXEL];
        px.copy_from_slice(&self.pix[i..i + BYTES_PER_PIXEL]);
        Some(px)
    }

    /// Write one pixel. Points outside the rectangle are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, px: [u8; 4]) {
        let Some(i) = self.pix_offset(x, y) else {
            return;
        };
        self.pix[i..i + BYTES_PER_PIXEL].copy_from_slice(&px);
    }

    /// Re-lay the image out for `rect` over the same backing array.
    pub fn adjust(&mut self, rect: Rect) {
        self.layout = PackedLayout::new(rect);
        if self.pix.len() < self.layout.length {
            self.pix.resize(self.layout.length, 0);
        }
    }

    /// Give up the backing array, e.g. to hand it to a pool directly.
    pub fn into_pix(self) -> Vec<u8> {
        self.pix
    }
}

impl<M: PixelFormat> fmt::Debug for PackedImage<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(M::NAME)
            .field("rect", &self.layout.rect)
            .field("stride", &self.layout.stride)
            .field("backing", &self.pix.len())
            .finish()
    }
}

/// Planar YCbCr 4:2:0 image.
#[derive(Clone)]
pub struct YCbCrImage {
    pix: Vec<u8>,
    layout: YCbCrLayout,
}

impl YCbCrImage {
    pub fn new(rect: Rect) -> Self {
        let layout = YCbCrLayout::new_420(rect);
        Self::from_pix(vec![0u8; layout.length()], rect)
    }

    pub fn from_pix(mut pix: Vec<u8>, rect: Rect) -> Self {
        let layout = YCbCrLayout::new_420(rect);
        if pix.len() < layout.length() {
            pix.resize(layout.length(), 0);
        }
        Self { pix, layout }
    }

    pub fn rect(&self) -> Rect {
        self.layout.rect
    }

    pub fn ratio(&self) -> SubsampleRatio {
        self.layout.ratio
    }

    pub fn y_stride(&self) -> usize {
        self.layout.y_stride
    }

    pub fn c_stride(&self) -> usize {
        self.layout.c_stride
    }

    pub fn layout(&self) -> &YCbCrLayout {
        &self.layout
    }

    pub fn y(&self) -> &[u8] {
        &self.pix[..self.layout.i0]
    }

    pub fn cb(&self) -> &[u8] {
        &self.pix[self.layout.i0..self.layout.i1]
    }

    pub fn cr(&self) -> &[u8] {
        &self.pix[self.layout.i1..self.layout.i2]
    }

    /// Mutable `(Y, Cb, Cr)` planes.
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8], &mut [u8]) {
        let YCbCrLayout { i0, i1, i2, .. } = self.layout;
        let (y, rest) = self.pix[..i2].split_at_mut(i0);
        let (cb, cr) = rest.split_at_mut(i1 - i0);
        (y, cb, cr)
    }

    /// Re-lay the planes out for `rect` over the same backing array.
    pub fn adjust(&mut self, rect: Rect) {
        self.layout = YCbCrLayout::new_420(rect);
        if self.pix.len() < self.layout.length() {
            self.pix.resize(self.layout.length(), 0);
        }
    }

    pub fn into_pix(self) -> Vec<u8> {
        self.pix
    }
}

impl fmt::Debug for YCbCrImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YCbCr")
            .field("rect", &self.layout.rect)
            .field("ratio", &self.layout.ratio)
            .field("y_stride", &self.layout.y_stride)
            .field("c_stride", &self.layout.c_stride)
            .field("backing", &self.pix.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_access() {
        let mut img = RgbaImage::new(Rect::new(10, 10, 14, 12));
        assert_eq!(img.stride(), 16);
        assert_eq!(img.pix().len(), 32);

        img.set_pixel(11, 11, [1, 2, 3, 4]);
        assert_eq!(img.pixel(11, 11), Some([1, 2, 3, 4]));
        assert_eq!(img.pix_offset(11, 11), Some(20));
        assert_eq!(img.pixel(0, 0), None);

        img.set_pixel(100, 100, [9; 4]);
        assert!(img.pix().iter().filter(|b| **b == 9).count() == 0);
    }

    #[test]
    fn test_adjust_uses_prefix() {
        let mut img = NrgbaImage::new(Rect::with_size(8, 8));
        img.adjust(Rect::with_size(2, 3));
        assert_eq!(img.stride(), 8);
        assert_eq!(img.pix().len(), 24);
        assert_eq!(img.into_pix().len(), 256);
    }

    #[test]
    fn test_planes_disjoint() {
        let mut img = YCbCrImage::new(Rect::with_size(100, 100));
        {
            let (y, cb, cr) = img.planes_mut();
            assert_eq!((y.len(), cb.len(), cr.len()), (10_000, 2_500, 2_500));
            y.fill(1);
            cb.fill(2);
            cr.fill(3);
        }
        assert!(img.y().iter().all(|b| *b == 1));
        assert!(img.cb().iter().all(|b| *b == 2));
        assert!(img.cr().iter().all(|b| *b == 3));
    }

    #[test]
    fn test_ycbcr_adjust_grows_when_chroma_shifts() {
        let mut img = YCbCrImage::new(Rect::with_size(2, 2));
        assert_eq!(img.into_pix().len(), 6);

        let mut img = YCbCrImage::new(Rect::with_size(2, 2));
        img.adjust(Rect::new(1, 1, 3, 3));
        assert_eq!(img.c_stride(), 2);
        assert_eq!(img.cr().len(), 4);
    }
}
