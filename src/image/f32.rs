//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Used for grayscale region crops, Laplacian responses and normalized
//! patches. Values keep whatever scale the producer chose (0..255 for
//! sharpness, 0..1 for patches).
use super::traits::{ImageView, ImageViewMut};
use super::ImageU8;
use crate::regions::Region;

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Grayscale copy of `region`, in 8-bit luma units (0..255).
    pub fn gray_region(image: &ImageU8<'_>, region: &Region) -> Self {
        let mut out = Self::new(region.width(), region.height());
        for (dy, y) in (region.row_start..region.row_end).enumerate() {
            let dst = out.row_mut(dy);
            for (dx, x) in (region.col_start..region.col_end).enumerate() {
                dst[dx] = image.luma(x, y) as f32;
            }
        }
        out
    }

    /// Copy the `w × h` window whose top-left corner is (x0, y0), scaling
    /// every sample by `scale`.
    pub fn crop_scaled(&self, x0: usize, y0: usize, w: usize, h: usize, scale: f32) -> Self {
        debug_assert!(x0 + w <= self.w && y0 + h <= self.h);
        let mut out = Self::new(w, h);
        for y in 0..h {
            let src = &self.row(y0 + y)[x0..x0 + w];
            for (dst, &v) in out.row_mut(y).iter_mut().zip(src) {
                *dst = v * scale;
            }
        }
        out
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Population mean and variance over all pixels, accumulated in f64.
    pub fn mean_variance(&self) -> (f64, f64) {
        let n = (self.w * self.h) as f64;
        if n == 0.0 {
            return (0.0, 0.0);
        }
        let mean = self
            .rows()
            .map(|r| r.iter().map(|&v| v as f64).sum::<f64>())
            .sum::<f64>()
            / n;
        let var = self
            .rows()
            .map(|r| {
                r.iter()
                    .map(|&v| {
                        let d = v as f64 - mean;
                        d * d
                    })
                    .sum::<f64>()
            })
            .sum::<f64>()
            / n;
        (mean, var)
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_region_copies_only_the_window() {
        let (w, h) = (6usize, 4usize);
        let data: Vec<u8> = (0..w * h).map(|i| i as u8).collect();
        let img = ImageU8 {
            w,
            h,
            channels: 1,
            stride: w,
            data: &data,
        };
        let gray = ImageF32::gray_region(&img, &Region::new(1, 3, 2, 5));
        assert_eq!((gray.w, gray.h), (3, 2));
        assert_eq!(gray.row(0), &[8.0, 9.0, 10.0]);
        assert_eq!(gray.row(1), &[14.0, 15.0, 16.0]);
    }

    #[test]
    fn mean_variance_of_two_levels() {
        let mut img = ImageF32::new(2, 2);
        img.set(0, 0, 2.0);
        img.set(1, 1, 2.0);
        let (mean, var) = img.mean_variance();
        assert!((mean - 1.0).abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }
}
