//! Concurrent per-region scoring and aggregation.
//!
//! One task per selected region extracts and normalizes that region's
//! patches, runs each through the shared [`QualityModel`] using its own
//! [`ScoringWorkspace`], and averages the patch scores. Regions too small to
//! hold a patch yield no score and are left out of the aggregate. The
//! aggregate is the arithmetic mean of all produced region scores.

use crate::error::{CompressError, CompressResult};
use crate::image::ImageU8;
use crate::model::{QualityModel, ScoringWorkspace};
use crate::patches::{extract_patches, NormalizationParams};
use crate::regions::Region;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Controls whether regions are scored sequentially or on the rayon pool.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ParallelScoringOptions {
    enabled: bool,
    min_regions_for_parallel: usize,
}

impl ParallelScoringOptions {
    /// Construct explicit options.
    pub fn new(enabled: bool, min_regions_for_parallel: usize) -> Self {
        Self {
            enabled,
            min_regions_for_parallel: min_regions_for_parallel.max(1),
        }
    }

    /// Disable parallel scoring regardless of region count.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_regions_for_parallel: usize::MAX,
        }
    }

    /// Returns true when parallel scoring should be used for `region_count`.
    pub fn should_parallelize(&self, region_count: usize) -> bool {
        self.enabled && region_count >= self.min_regions_for_parallel
    }
}

impl Default for ParallelScoringOptions {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            min_regions_for_parallel: 2,
        }
    }
}

/// Outcome of scoring one region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionQuality {
    pub region: Region,
    pub patches: usize,
    /// Mean patch score; `None` when the region held no full patch.
    pub score: Option<f64>,
}

/// Aggregate over all selected regions.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityEstimate {
    pub aggregate: f64,
    pub regions: Vec<RegionQuality>,
}

impl QualityEstimate {
    /// Number of regions that contributed to the aggregate.
    pub fn scored_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.score.is_some()).count()
    }
}

/// Score a single region; the workspace is private to the calling task.
pub fn score_region(
    model: &QualityModel,
    image: &ImageU8<'_>,
    region: &Region,
    params: &NormalizationParams,
    ws: &mut ScoringWorkspace,
) -> RegionQuality {
    let patches = extract_patches(image, region, params);
    if patches.is_empty() {
        debug!(
            "score_region skipped degenerate region {}x{} at ({}, {})",
            region.width(),
            region.height(),
            region.col_start,
            region.row_start
        );
        return RegionQuality {
            region: *region,
            patches: 0,
            score: None,
        };
    }
    let sum: f64 = patches
        .iter()
        .map(|p| model.score_patch(&p.pixels, ws) as f64)
        .sum();
    RegionQuality {
        region: *region,
        patches: patches.len(),
        score: Some(sum / patches.len() as f64),
    }
}

/// Mean of the produced region scores, skipping regions without one.
pub fn aggregate(regions: &[RegionQuality]) -> CompressResult<f64> {
    let scores: Vec<f64> = regions.iter().filter_map(|r| r.score).collect();
    if scores.is_empty() {
        return Err(CompressError::AllRegionsDegenerate {
            selected: regions.len(),
        });
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Score every region (one task each) and aggregate the results.
pub fn score_regions(
    model: &QualityModel,
    image: &ImageU8<'_>,
    regions: &[Region],
    params: &NormalizationParams,
    parallel: ParallelScoringOptions,
) -> CompressResult<QualityEstimate> {
    let scored = if parallel.should_parallelize(regions.len()) {
        score_parallel(model, image, regions, params)
    } else {
        score_sequential(model, image, regions, params)
    };
    let degenerate = scored.iter().filter(|r| r.score.is_none()).count();
    if degenerate > 0 {
        warn!(
            "{} of {} selected regions are smaller than a patch and were not scored",
            degenerate,
            scored.len()
        );
    }
    let aggregate = aggregate(&scored)?;
    debug!(
        "score_regions regions={} scored={} aggregate={:.4}",
        scored.len(),
        scored.len() - degenerate,
        aggregate
    );
    Ok(QualityEstimate {
        aggregate,
        regions: scored,
    })
}

fn score_sequential(
    model: &QualityModel,
    image: &ImageU8<'_>,
    regions: &[Region],
    params: &NormalizationParams,
) -> Vec<RegionQuality> {
    let mut ws = ScoringWorkspace::new();
    regions
        .iter()
        .map(|region| score_region(model, image, region, params, &mut ws))
        .collect()
}

#[cfg(feature = "parallel")]
fn score_parallel(
    model: &QualityModel,
    image: &ImageU8<'_>,
    regions: &[Region],
    params: &NormalizationParams,
) -> Vec<RegionQuality> {
    // indexed collect keeps selection order regardless of completion order
    regions
        .par_iter()
        .map(|region| {
            let mut ws = ScoringWorkspace::new();
            score_region(model, image, region, params, &mut ws)
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn score_parallel(
    model: &QualityModel,
    image: &ImageU8<'_>,
    regions: &[Region],
    params: &NormalizationParams,
) -> Vec<RegionQuality> {
    score_sequential(model, image, regions, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quality(score: Option<f64>) -> RegionQuality {
        RegionQuality {
            region: Region::new(0, 1, 0, 1),
            patches: usize::from(score.is_some()),
            score,
        }
    }

    #[test]
    fn aggregate_skips_unscored_regions() {
        let regions = [quality(Some(2.0)), quality(None), quality(Some(4.0))];
        assert_eq!(aggregate(&regions).unwrap(), 3.0);
    }

    #[test]
    fn aggregate_of_only_degenerate_regions_is_an_error() {
        let regions = [quality(None), quality(None)];
        match aggregate(&regions) {
            Err(CompressError::AllRegionsDegenerate { selected }) => assert_eq!(selected, 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn aggregate_is_order_independent() {
        let values = [12.5, 30.25, 47.0, 3.75, 66.5, 21.0];
        let forward: Vec<_> = values.iter().map(|&v| quality(Some(v))).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(2);
        let a = aggregate(&forward).unwrap();
        assert!((a - aggregate(&reversed).unwrap()).abs() < 1e-9);
        assert!((a - aggregate(&rotated).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn parallel_options_threshold() {
        let opts = ParallelScoringOptions::new(true, 3);
        assert!(!opts.should_parallelize(2));
        assert!(opts.should_parallelize(6));
        assert!(!ParallelScoringOptions::disabled().should_parallelize(6));
    }
}
