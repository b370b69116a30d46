//! No-reference patch quality network.
//!
//! Architecture (inference only):
//! - 7×7 valid convolution, 1 → 50 channels (32×32 input → 26×26 map).
//! - Max-min pooling: per-channel global maximum and global minimum,
//!   concatenated as `[max_0..max_49, min_0..min_49]`.
//! - Dense 100 → 800, ReLU; dense 800 → 800, ReLU (dropout is the identity
//!   at inference and is not represented).
//! - Dense 800 → 1 producing the patch score. Lower scores mean worse quality.
//!
//! [`QualityModel`] holds only immutable weights and is shared by reference
//! across scoring tasks. All intermediate buffers live in a caller-owned
//! [`ScoringWorkspace`], one per task.

pub mod weights;

pub use weights::{ModelWeights, RawTensors, TENSOR_SHAPES};

use crate::error::ModelError;
use crate::image::{ImageF32, ImageView};
use log::info;
use nalgebra::DVector;
use std::path::Path;

/// Convolution kernel side length.
pub const KERNEL_SIZE: usize = 7;
/// Number of convolution output channels.
pub const CONV_CHANNELS: usize = 50;
/// Length of the pooled feature vector (max and min per channel).
pub const FEATURES: usize = 2 * CONV_CHANNELS;
/// Width of both hidden dense layers.
pub const HIDDEN: usize = 800;

/// Pretrained quality network.
#[derive(Clone, Debug)]
pub struct QualityModel {
    weights: ModelWeights,
}

/// Per-task scratch buffers for forward passes.
pub struct ScoringWorkspace {
    features: DVector<f32>,
    hidden1: DVector<f32>,
    hidden2: DVector<f32>,
}

impl Default for ScoringWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringWorkspace {
    pub fn new() -> Self {
        Self {
            features: DVector::zeros(FEATURES),
            hidden1: DVector::zeros(HIDDEN),
            hidden2: DVector::zeros(HIDDEN),
        }
    }

    /// Pooled features of the most recent forward pass.
    pub fn features(&self) -> &[f32] {
        self.features.as_slice()
    }
}

impl QualityModel {
    pub fn new(weights: ModelWeights) -> Self {
        Self { weights }
    }

    /// Load the model artifact once at startup.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let weights = ModelWeights::load(path)?;
        info!("loaded quality model from {}", path.display());
        Ok(Self::new(weights))
    }

    /// Score one normalized patch.
    pub fn score_patch(&self, patch: &ImageF32, ws: &mut ScoringWorkspace) -> f32 {
        self.max_min_pool(patch, &mut ws.features);

        let w = &self.weights;
        ws.hidden1.copy_from(&w.fc1.bias);
        ws.hidden1.gemv(1.0, &w.fc1.weight, &ws.features, 1.0);
        ws.hidden1.apply(|v| *v = v.max(0.0));

        ws.hidden2.copy_from(&w.fc2.bias);
        ws.hidden2.gemv(1.0, &w.fc2.weight, &ws.hidden1, 1.0);
        ws.hidden2.apply(|v| *v = v.max(0.0));

        w.fc3_weight.dot(&ws.hidden2) + w.fc3_bias
    }

    /// Valid 7×7 convolution followed by per-channel global max and min.
    fn max_min_pool(&self, patch: &ImageF32, out: &mut DVector<f32>) {
        debug_assert!(patch.w >= KERNEL_SIZE && patch.h >= KERNEL_SIZE);
        let out_w = patch.w + 1 - KERNEL_SIZE;
        let out_h = patch.h + 1 - KERNEL_SIZE;
        for k in 0..CONV_CHANNELS {
            let kernel = self.weights.kernel(k);
            let bias = self.weights.conv_bias[k];
            let mut hi = f32::NEG_INFINITY;
            let mut lo = f32::INFINITY;
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut acc = bias;
                    for (ky, taps) in kernel.chunks_exact(KERNEL_SIZE).enumerate() {
                        let src = &patch.row(oy + ky)[ox..ox + KERNEL_SIZE];
                        acc += src.iter().zip(taps).map(|(a, b)| a * b).sum::<f32>();
                    }
                    hi = hi.max(acc);
                    lo = lo.min(acc);
                }
            }
            out[k] = hi;
            out[CONV_CHANNELS + k] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::weights::*;
    use super::*;
    use crate::patches::PATCH_SIZE;

    fn raw_with(f: impl Fn(&mut RawTensors)) -> ModelWeights {
        let size = |name: &str| {
            TENSOR_SHAPES
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, s)| s.iter().product::<usize>())
                .unwrap()
        };
        let mut raw = RawTensors {
            conv_weight: vec![0.0; size(CONV_WEIGHT)],
            conv_bias: vec![0.0; size(CONV_BIAS)],
            fc1_weight: vec![0.0; size(FC1_WEIGHT)],
            fc1_bias: vec![0.0; size(FC1_BIAS)],
            fc2_weight: vec![0.0; size(FC2_WEIGHT)],
            fc2_bias: vec![0.0; size(FC2_BIAS)],
            fc3_weight: vec![0.0; size(FC3_WEIGHT)],
            fc3_bias: vec![0.0; size(FC3_BIAS)],
        };
        f(&mut raw);
        ModelWeights::from_raw(raw).unwrap()
    }

    #[test]
    fn zero_network_returns_output_bias() {
        let model = QualityModel::new(raw_with(|r| r.fc3_bias[0] = 42.5));
        let mut ws = ScoringWorkspace::new();
        let patch = ImageF32::new(PATCH_SIZE, PATCH_SIZE);
        assert_eq!(model.score_patch(&patch, &mut ws), 42.5);
    }

    #[test]
    fn max_min_pooling_tracks_extremes() {
        // channel 0 copies the kernel's top-left sample
        let model = QualityModel::new(raw_with(|r| r.conv_weight[0] = 1.0));
        let mut ws = ScoringWorkspace::new();
        let mut patch = ImageF32::new(PATCH_SIZE, PATCH_SIZE);
        patch.set(3, 4, 2.0);
        patch.set(25, 25, -3.0);
        patch.set(31, 31, 9.0); // outside every window's top-left tap
        model.score_patch(&patch, &mut ws);
        let features = ws.features();
        assert_eq!(features[0], 2.0);
        assert_eq!(features[CONV_CHANNELS], -3.0);
        assert_eq!(features[1], 0.0);
        assert_eq!(features[CONV_CHANNELS + 1], 0.0);
    }

    #[test]
    fn relu_clips_negative_hidden_units() {
        let model = QualityModel::new(raw_with(|r| {
            r.fc1_bias[0] = -5.0;
            r.fc1_bias[1] = 3.0;
            // hidden2[0] = hidden1[0] + hidden1[1]
            r.fc2_weight[0] = 1.0;
            r.fc2_weight[1] = 1.0;
            r.fc3_weight[0] = 2.0;
            r.fc3_bias[0] = 1.0;
        }));
        let mut ws = ScoringWorkspace::new();
        let patch = ImageF32::new(PATCH_SIZE, PATCH_SIZE);
        assert_eq!(model.score_patch(&patch, &mut ws), 7.0);
    }

    #[test]
    fn workspace_reuse_is_stateless() {
        let model = QualityModel::new(raw_with(|r| {
            r.conv_weight.iter_mut().enumerate().for_each(|(i, v)| *v = ((i % 13) as f32 - 6.0) * 0.01);
            r.fc1_weight.iter_mut().enumerate().for_each(|(i, v)| *v = ((i % 7) as f32 - 3.0) * 0.01);
            r.fc2_weight.iter_mut().enumerate().for_each(|(i, v)| *v = ((i % 5) as f32 - 2.0) * 0.001);
            r.fc3_weight.iter_mut().for_each(|v| *v = 0.01);
        }));
        let mut patch = ImageF32::new(PATCH_SIZE, PATCH_SIZE);
        for (i, v) in patch.data.iter_mut().enumerate() {
            *v = ((i * 31 % 17) as f32 - 8.0) * 0.1;
        }
        let mut shared = ScoringWorkspace::new();
        let first = model.score_patch(&patch, &mut shared);
        let _ = model.score_patch(&ImageF32::new(PATCH_SIZE, PATCH_SIZE), &mut shared);
        let again = model.score_patch(&patch, &mut shared);
        let fresh = model.score_patch(&patch, &mut ScoringWorkspace::new());
        assert_eq!(first, again);
        assert_eq!(first, fresh);
    }
}
