use super::image::{Nrgba, PackedImage, PixelFormat, Rgba, YCbCrImage};
use super::{PackedLayout, Rect, SubsampleRatio, YCbCrLayout};
use crate::config::PoolOptions;
use crate::error::Result;
use crate::pool::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use std::marker::PhantomData;
use tracing::debug;

/// Backing arrays of at least `length` bytes, trimmed to `length` on return.
#[derive(Debug, Clone, Copy)]
pub struct PixPolicy {
    length: usize,
}

impl PixPolicy {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Policy<Vec<u8>> for PixPolicy {
    fn allocate(&self) -> Vec<u8> {
        vec![0u8; self.length]
    }

    fn admit(&self, mut pix: Vec<u8>) -> Option<Vec<u8>> {
        if pix.capacity() < self.length {
            return None;
        }
        pix.resize(self.length, 0);
        Some(pix)
    }

    fn nominal_size(&self) -> usize {
        self.length
    }
}

/// Pool of packed images for one fixed rectangle.
pub struct PackedPool<M> {
    pool: BoundedPool<Vec<u8>, PixPolicy>,
    layout: PackedLayout,
    _format: PhantomData<M>,
}

pub type RgbaPool = PackedPool<Rgba>;
pub type NrgbaPool = PackedPool<Nrgba>;

impl<M: PixelFormat> PackedPool<M> {
    pub fn new(capacity: usize, rect: Rect, options: &PoolOptions) -> Self {
        let layout = PackedLayout::new(rect);
        debug!(format = M::NAME, %rect, length = layout.length, capacity, "raster pool created");
        Self {
            pool: BoundedPool::new(capacity, PixPolicy::new(layout.length), options),
            layout,
            _format: PhantomData,
        }
    }

    pub fn get(&self) -> PackedImage<M> {
        PackedImage::from_pix(self.pool.get(), self.layout.rect)
    }

    pub fn get_ref(&self) -> Ref<'_, PackedImage<M>> {
        Ref::pooled(self.get(), self)
    }

    pub fn put(&self, image: PackedImage<M>) -> bool {
        self.put_pix(image.into_pix())
    }

    /// Return a bare backing array.
    pub fn put_pix(&self, pix: Vec<u8>) -> bool {
        self.pool.put(pix)
    }

    pub fn rect(&self) -> Rect {
        self.layout.rect
    }

    pub fn layout(&self) -> &PackedLayout {
        &self.layout
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

impl<M: PixelFormat> Recycle<PackedImage<M>> for PackedPool<M> {
    fn put(&self, image: PackedImage<M>) -> bool {
        PackedPool::put(self, image)
    }
}

impl<M: PixelFormat> PoolSize for PackedPool<M> {
    fn len(&self) -> usize {
        PackedPool::len(self)
    }

    fn cap(&self) -> usize {
        PackedPool::cap(self)
    }
}

/// Pool of planar YCbCr images for one fixed rectangle.
pub struct YCbCrPool {
    pool: BoundedPool<Vec<u8>, PixPolicy>,
    layout: YCbCrLayout,
}

impl YCbCrPool {
    /// Fails with `UnsupportedSubsampleRatio` for anything but 4:2:0.
    pub fn new(capacity: usize, rect: Rect, ratio: SubsampleRatio, options: &PoolOptions) -> Result<Self> {
        let layout = YCbCrLayout::new(rect, ratio)?;
        debug!(%rect, %ratio, length = layout.length(), capacity, "ycbcr pool created");
        Ok(Self {
            pool: BoundedPool::new(capacity, PixPolicy::new(layout.length()), options),
            layout,
        })
    }

    pub fn get(&self) -> YCbCrImage {
        YCbCrImage::from_pix(self.pool.get(), self.layout.rect)
    }

    pub fn get_ref(&self) -> Ref<'_, YCbCrImage> {
        Ref::pooled(self.get(), self)
    }

    pub fn put(&self, image: YCbCrImage) -> bool {
        self.put_pix(image.into_pix())
    }

    pub fn put_pix(&self, pix: Vec<u8>) -> bool {
        self.pool.put(pix)
    }

    pub fn rect(&self) -> Rect {
        self.layout.rect
    }

    pub fn layout(&self) -> &YCbCrLayout {
        &self.layout
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

impl Recycle<YCbCrImage> for YCbCrPool {
    fn put(&self, image: YCbCrImage) -> bool {
        YCbCrPool::put(self, image)
    }
}

impl PoolSize for YCbCrPool {
    fn len(&self) -> usize {
        YCbCrPool::len(self)
    }

    fn cap(&self) -> usize {
        YCbCrPool::cap(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_rgba_pool() {
        let pool = RgbaPool::new(4, Rect::with_size(16, 8), &PoolOptions::default());

        let mut img = pool.get();
        assert_eq!(img.rect(), Rect::with_size(16, 8));
        assert_eq!(img.stride(), 64);
        assert_eq!(img.pix().len(), 512);
        img.set_pixel(0, 0, [255, 0, 0, 255]);
        assert!(pool.put(img));

        assert!(!pool.put_pix(vec![0u8; 100]));
        assert!(pool.put_pix(vec![0u8; 1024]));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_nrgba_ref() {
        let pool = NrgbaPool::new(1, Rect::with_size(4, 4), &PoolOptions::default());
        {
            let r = pool.get_ref();
            assert_eq!(r.get().map(|img| img.pix().len()), Some(64));
        }
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_ycbcr_pool() {
        let pool = YCbCrPool::new(2, Rect::with_size(100, 100), SubsampleRatio::Ratio420, &PoolOptions::default())
            .unwrap();
        let img = pool.get();
        assert_eq!(img.y().len(), 10_000);
        assert_eq!(img.cb().len(), 2_500);
        assert_eq!(img.cr().len(), 2_500);
        assert!(pool.put(img));
        assert!(!pool.put_pix(vec![0u8; 14_999]));
    }

    #[test]
    fn test_ycbcr_rejects_444() {
        let res = YCbCrPool::new(2, Rect::with_size(8, 8), SubsampleRatio::Ratio444, &PoolOptions::default());
        assert!(matches!(res, Err(Error::UnsupportedSubsampleRatio(_))));
    }

    #[test]
    fn test_preload() {
        let opts = PoolOptions::new().with_preload(true);
        let pool = RgbaPool::new(12, Rect::with_size(2, 2), &opts);
        assert_eq!(pool.len(), 3);
    }
}
