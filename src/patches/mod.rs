//! Patch extraction and local contrast normalization.
//!
//! A region is tiled into non-overlapping `PATCH_SIZE × PATCH_SIZE` blocks
//! (row-major, stride equal to the patch size). Partial tiles at the right and
//! bottom edges are dropped, so regions smaller than one patch in either axis
//! produce no patches at all.
//!
//! Each patch is normalized on its own: a 3×3 local mean `μ` and local
//! mean-of-squares are taken with symmetric border extension, and every
//! sample becomes `(v − μ) / (sqrt(max(E[v²] − μ², 0)) + C)`. This removes
//! slow luminance and contrast changes so the model sees texture statistics.

pub mod filters;

use crate::image::{ImageF32, ImageU8, ImageView, ImageViewMut};
use crate::regions::Region;
use filters::{apply as apply_filter, SeparableFilter, BOX_3TAP};
use serde::{Deserialize, Serialize};

/// Side length of a scoring patch in pixels.
pub const PATCH_SIZE: usize = 32;

/// Parameters of the local contrast normalization.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizationParams {
    /// Constant added to the local standard deviation.
    pub stabilizer: f32,
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self { stabilizer: 1.0 }
    }
}

/// Normalized patch plus its top-left corner inside the source region.
#[derive(Clone, Debug)]
pub struct Patch {
    pub x0: usize,
    pub y0: usize,
    pub pixels: ImageF32,
}

/// Number of full patches that fit into `region`.
pub fn patch_count(region: &Region) -> usize {
    (region.width() / PATCH_SIZE) * (region.height() / PATCH_SIZE)
}

/// Tile `region` of `image` into normalized patches.
///
/// Pixel values are grayscale in `[0, 1]` before normalization.
pub fn extract_patches(
    image: &ImageU8<'_>,
    region: &Region,
    params: &NormalizationParams,
) -> Vec<Patch> {
    let count = patch_count(region);
    if count == 0 {
        return Vec::new();
    }
    let gray = ImageF32::gray_region(image, region);
    let (nx, ny) = (gray.w / PATCH_SIZE, gray.h / PATCH_SIZE);
    let mut patches = Vec::with_capacity(count);
    for ty in 0..ny {
        for tx in 0..nx {
            let (x0, y0) = (tx * PATCH_SIZE, ty * PATCH_SIZE);
            let raw = gray.crop_scaled(x0, y0, PATCH_SIZE, PATCH_SIZE, 1.0 / 255.0);
            patches.push(Patch {
                x0,
                y0,
                pixels: normalize_patch(&raw, &BOX_3TAP, params),
            });
        }
    }
    patches
}

/// Local contrast normalization of a single patch.
pub fn normalize_patch(
    patch: &ImageF32,
    window: &dyn SeparableFilter,
    params: &NormalizationParams,
) -> ImageF32 {
    let mean = apply_filter(window, patch);
    let mut squared = patch.clone();
    squared.data.iter_mut().for_each(|v| *v *= *v);
    let mean_sq = apply_filter(window, &squared);

    let mut out = ImageF32::new(patch.w, patch.h);
    for y in 0..patch.h {
        let src = patch.row(y);
        let mu = mean.row(y);
        let mu2 = mean_sq.row(y);
        let dst = out.row_mut(y);
        for x in 0..patch.w {
            let var = (mu2[x] - mu[x] * mu[x]).max(0.0);
            dst[x] = (src[x] - mu[x]) / (var.sqrt() + params.stabilizer);
        }
    }
    out
}
