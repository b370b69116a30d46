//! Sharpness ranking of grid regions and extreme-region selection.
//!
//! Every region is scored by the variance of its Laplacian response. Regions
//! are sorted ascending (stable, ties keep partition order) and only the
//! `extremes_per_side` blurriest plus the same number of sharpest are kept,
//! so the expensive quality model runs on a handful of informative regions.

pub mod laplacian;

pub use laplacian::{laplacian, laplacian_variance};

use crate::image::{ImageF32, ImageU8};
use crate::regions::Region;
use log::debug;
use serde::{Deserialize, Serialize};

/// Region paired with its Laplacian variance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharpnessScore {
    pub region: Region,
    pub score: f64,
}

/// Controls how many regions survive selection.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionParams {
    /// Regions kept from each end of the sorted sharpness order; 0 acts as 1.
    pub extremes_per_side: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            extremes_per_side: 3,
        }
    }
}

/// Sharpness of one region of `image`, in 8-bit luma units.
pub fn region_sharpness(image: &ImageU8<'_>, region: &Region) -> f64 {
    laplacian_variance(&ImageF32::gray_region(image, region))
}

/// Score every region and return them sorted ascending by sharpness.
pub fn rank_regions(image: &ImageU8<'_>, regions: &[Region]) -> Vec<SharpnessScore> {
    let mut scored: Vec<SharpnessScore> = regions
        .iter()
        .map(|region| SharpnessScore {
            region: *region,
            score: region_sharpness(image, region),
        })
        .collect();
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));
    scored
}

/// Keep the `k` lowest and `k` highest entries of an ascending ranking.
///
/// Rankings with at most `2k` entries are returned unchanged. `k` is at
/// least 1, so a non-empty ranking always yields a non-empty selection.
pub fn select_extremes(ranked: &[SharpnessScore], params: &SelectionParams) -> Vec<Region> {
    let k = params.extremes_per_side.max(1);
    if ranked.len() <= k.saturating_mul(2) {
        return ranked.iter().map(|s| s.region).collect();
    }
    ranked[..k]
        .iter()
        .chain(&ranked[ranked.len() - k..])
        .map(|s| s.region)
        .collect()
}

/// Rank `regions` and select the extremes in one step.
pub fn select_regions(
    image: &ImageU8<'_>,
    regions: &[Region],
    params: &SelectionParams,
) -> (Vec<SharpnessScore>, Vec<Region>) {
    let ranked = rank_regions(image, regions);
    let selected = select_extremes(&ranked, params);
    debug!(
        "select_regions ranked={} selected={} min={:.3} max={:.3}",
        ranked.len(),
        selected.len(),
        ranked.first().map_or(0.0, |s| s.score),
        ranked.last().map_or(0.0, |s| s.score),
    );
    (ranked, selected)
}
