//! Parameter types configuring the compression stages.
//!
//! Defaults reproduce the trained setup: a 4×4 region grid, the three
//! blurriest and three sharpest regions, and 3×3 local normalization with a
//! unit stabilizer.

use crate::patches::NormalizationParams;
use crate::regions::DEFAULT_DIVISIONS;
use crate::scoring::ParallelScoringOptions;
use crate::sharpness::SelectionParams;
use serde::{Deserialize, Serialize};

/// Pipeline-wide parameters.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressParams {
    /// Bands per axis of the region grid (>= 1).
    pub grid_divisions: usize,
    /// Extreme-sharpness region selection.
    pub selection: SelectionParams,
    /// Local contrast normalization applied to every patch.
    pub normalization: NormalizationParams,
    /// Region-level parallelism.
    pub parallel: ParallelScoringOptions,
}

impl Default for CompressParams {
    fn default() -> Self {
        Self {
            grid_divisions: DEFAULT_DIVISIONS,
            selection: SelectionParams::default(),
            normalization: NormalizationParams::default(),
            parallel: ParallelScoringOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: CompressParams =
            serde_json::from_str(r#"{ "selection": { "extremes_per_side": 2 } }"#).unwrap();
        assert_eq!(params.grid_divisions, 4);
        assert_eq!(params.selection.extremes_per_side, 2);
        assert_eq!(params.normalization.stabilizer, 1.0);
    }
}
