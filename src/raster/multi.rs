use super::image::{Nrgba, PackedImage, PixelFormat, Rgba, YCbCrImage};
use super::pool::{PackedPool, YCbCrPool};
use super::{Rect, SubsampleRatio};
use crate::config::PoolOptions;
use crate::error::{Error, Result};
use crate::pool::{PoolStats, Ref};
use serde::{Deserialize, Serialize};

/// One bucket request: `capacity` pooled images of `rect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectTier {
    pub capacity: usize,
    pub rect: Rect,
}

pub const fn rect_tier(capacity: usize, rect: Rect) -> RectTier {
    RectTier { capacity, rect }
}

// Dedup by exact rectangle (last wins), then order by width and height.
fn sorted_tiers(sizes: &[RectTier]) -> Vec<RectTier> {
    let mut tiers: Vec<RectTier> = Vec::with_capacity(sizes.len());
    for size in sizes {
        match tiers.iter_mut().find(|t| t.rect == size.rect) {
            Some(existing) => *existing = *size,
            None => tiers.push(*size),
        }
    }
    tiers.sort_by_key(|t| (t.rect.dx(), t.rect.dy()));
    tiers
}

fn find_bucket<'a, P>(buckets: &'a [(Rect, P)], rect: &Rect) -> Option<&'a P> {
    if rect.is_empty() {
        return None;
    }
    buckets
        .iter()
        .find(|(bucket, _)| bucket.fits(rect))
        .map(|(_, pool)| pool)
}

/// Routes packed images to the smallest bucket whose width and height cover the request.
pub struct MultiPackedPool<M> {
    buckets: Vec<(Rect, PackedPool<M>)>,
}

pub type MultiRgbaPool = MultiPackedPool<Rgba>;
pub type MultiNrgbaPool = MultiPackedPool<Nrgba>;

impl<M: PixelFormat> MultiPackedPool<M> {
    pub fn new(sizes: &[RectTier], options: &PoolOptions) -> Self {
        let buckets = sorted_tiers(sizes)
            .into_iter()
            .map(|t| (t.rect, PackedPool::new(t.capacity, t.rect, options)))
            .collect();
        Self { buckets }
    }

    pub fn find(&self, rect: &Rect) -> Option<&PackedPool<M>> {
        find_bucket(&self.buckets, rect)
    }

    /// Image laid out for `rect`, backed by a bucket's array when one fits.
    pub fn get(&self, rect: Rect) -> PackedImage<M> {
        match self.find(&rect) {
            Some(pool) => {
                let mut image = pool.get();
                image.adjust(rect);
                image
            }
            None => PackedImage::new(rect),
        }
    }

    pub fn get_ref(&self, rect: Rect) -> Ref<'_, PackedImage<M>> {
        match self.find(&rect) {
            Some(pool) => {
                let mut image = pool.get();
                image.adjust(rect);
                Ref::pooled(image, pool)
            }
            None => Ref::unpooled(PackedImage::new(rect)),
        }
    }

    /// Route by the image's rectangle.
    pub fn put(&self, image: PackedImage<M>) -> bool {
        let rect = image.rect();
        self.put_pix(image.into_pix(), rect)
    }

    pub fn put_pix(&self, pix: Vec<u8>, rect: Rect) -> bool {
        match self.find(&rect) {
            Some(pool) => pool.put_pix(pix),
            None => false,
        }
    }

    pub fn rects(&self) -> Vec<Rect> {
        self.buckets.iter().map(|(rect, _)| *rect).collect()
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.buckets.iter().map(|(_, pool)| pool.stats()).collect()
    }
}

/// Routes planar 4:2:0 images by rectangle.
pub struct MultiYCbCrPool {
    buckets: Vec<(Rect, YCbCrPool)>,
}

impl MultiYCbCrPool {
    pub fn new(ratio: SubsampleRatio, sizes: &[RectTier], options: &PoolOptions) -> Result<Self> {
        if ratio != SubsampleRatio::Ratio420 {
            return Err(Error::UnsupportedSubsampleRatio(ratio));
        }
        let buckets = sorted_tiers(sizes)
            .into_iter()
            .map(|t| YCbCrPool::new(t.capacity, t.rect, ratio, options).map(|pool| (t.rect, pool)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { buckets })
    }

    pub fn find(&self, rect: &Rect) -> Option<&YCbCrPool> {
        find_bucket(&self.buckets, rect)
    }

    pub fn get(&self, rect: Rect) -> YCbCrImage {
        match self.find(&rect) {
            Some(pool) => {
                let mut image = pool.get();
                image.adjust(rect);
                image
            }
            None => YCbCrImage::new(rect),
        }
    }

    pub fn get_ref(&self, rect: Rect) -> Ref<'_, YCbCrImage> {
        match self.find(&rect) {
            Some(pool) => {
                let mut image = pool.get();
                image.adjust(rect);
                Ref::pooled(image, pool)
            }
            None => Ref::unpooled(YCbCrImage::new(rect)),
        }
    }

    pub fn put(&self, image: YCbCrImage) -> bool {
        let rect = image.rect();
        self.put_pix(image.into_pix(), rect)
    }

    pub fn put_pix(&self, pix: Vec<u8>, rect: Rect) -> bool {
        match self.find(&rect) {
            Some(pool) => pool.put_pix(pix),
            None => false,
        }
    }

    pub fn rects(&self) -> Vec<Rect> {
        self.buckets.iter().map(|(rect, _)| *rect).collect()
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.buckets.iter().map(|(_, pool)| pool.stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_tiers() -> Vec<RectTier> {
        vec![
            rect_tier(2, Rect::with_size(1280, 720)),
            rect_tier(2, Rect::with_size(640, 640)),
            rect_tier(2, Rect::with_size(720, 1280)),
            rect_tier(2, Rect::with_size(640, 360)),
            rect_tier(2, Rect::with_size(360, 640)),
            rect_tier(5, Rect::with_size(640, 360)),
        ]
    }

    #[test]
    fn test_sort_order() {
        let pool = MultiRgbaPool::new(&video_tiers(), &PoolOptions::default());
        let sizes: Vec<(usize, usize)> = pool.rects().iter().map(|r| (r.dx(), r.dy())).collect();
        assert_eq!(
            sizes,
            vec![(360, 640), (640, 360), (640, 640), (720, 1280), (1280, 720)]
        );
        assert_eq!(pool.find(&Rect::with_size(640, 360)).map(|p| p.cap()), Some(5));
    }

    #[test]
    fn test_router_selection() {
        let pool = MultiRgbaPool::new(&video_tiers(), &PoolOptions::default());

        let pick = |w, h| pool.find(&Rect::with_size(w, h)).map(|p| p.rect());
        assert_eq!(pick(100, 100), Some(Rect::with_size(360, 640)));
        assert_eq!(pick(500, 300), Some(Rect::with_size(640, 360)));
        assert_eq!(pick(500, 500), Some(Rect::with_size(640, 640)));
        assert_eq!(pick(700, 700), Some(Rect::with_size(720, 1280)));
        assert_eq!(pick(1000, 700), Some(Rect::with_size(1280, 720)));
        assert_eq!(pick(2000, 2000), None);
        assert_eq!(pick(0, 10), None);
    }

    #[test]
    fn test_adjusted_image_round_trip() {
        let pool = MultiNrgbaPool::new(&video_tiers(), &PoolOptions::default());

        let img = pool.get(Rect::with_size(500, 300));
        assert_eq!(img.stride(), 2000);
        assert_eq!(img.pix().len(), 500 * 300 * 4);
        assert!(pool.put(img));
        assert_eq!(pool.find(&Rect::with_size(640, 360)).map(|p| p.len()), Some(1));

        let big = pool.get(Rect::with_size(2000, 2000));
        assert!(!pool.put(big));

        let r = pool.get_ref(Rect::with_size(2000, 10));
        assert!(!r.is_pooled());
    }

    #[test]
    fn test_ycbcr_router() {
        let pool = MultiYCbCrPool::new(SubsampleRatio::Ratio420, &video_tiers(), &PoolOptions::default()).unwrap();
        {
            let r = pool.get_ref(Rect::with_size(100, 100));
            let img = r.get().unwrap();
            assert_eq!(img.y_stride(), 100);
            assert_eq!(img.c_stride(), 50);
            assert_eq!(img.cr().len(), 2_500);
        }
        assert_eq!(pool.find(&Rect::with_size(360, 640)).map(|p| p.len()), Some(1));

        let err = MultiYCbCrPool::new(SubsampleRatio::Ratio422, &video_tiers(), &PoolOptions::default());
        assert!(matches!(err, Err(Error::UnsupportedSubsampleRatio(SubsampleRatio::Ratio422))));
    }
}
