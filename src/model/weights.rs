//! Read-only parameter set of the quality network and its artifact loader.
//!
//! The artifact is a `safetensors` file holding the trained network's state
//! dict. Every tensor is checked against the fixed architecture; any mismatch
//! is a startup failure.
use super::{CONV_CHANNELS, FEATURES, HIDDEN, KERNEL_SIZE};
use crate::error::ModelError;
use nalgebra::{DMatrix, DVector};
use safetensors::{Dtype, SafeTensors};
use std::fs;
use std::path::Path;

pub const CONV_WEIGHT: &str = "conv1.weight";
pub const CONV_BIAS: &str = "conv1.bias";
pub const FC1_WEIGHT: &str = "fc1.weight";
pub const FC1_BIAS: &str = "fc1.bias";
pub const FC2_WEIGHT: &str = "fc2.weight";
pub const FC2_BIAS: &str = "fc2.bias";
pub const FC3_WEIGHT: &str = "fc3.weight";
pub const FC3_BIAS: &str = "fc3.bias";

/// Expected tensor names and shapes, in artifact order.
pub const TENSOR_SHAPES: [(&str, &[usize]); 8] = [
    (CONV_WEIGHT, &[CONV_CHANNELS, 1, KERNEL_SIZE, KERNEL_SIZE]),
    (CONV_BIAS, &[CONV_CHANNELS]),
    (FC1_WEIGHT, &[HIDDEN, FEATURES]),
    (FC1_BIAS, &[HIDDEN]),
    (FC2_WEIGHT, &[HIDDEN, HIDDEN]),
    (FC2_BIAS, &[HIDDEN]),
    (FC3_WEIGHT, &[1, HIDDEN]),
    (FC3_BIAS, &[1]),
];

/// Fully-connected layer `y = W x + b`.
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weight: DMatrix<f32>,
    pub bias: DVector<f32>,
}

/// Network parameters; immutable once constructed.
#[derive(Clone, Debug)]
pub struct ModelWeights {
    /// `CONV_CHANNELS` kernels of `KERNEL_SIZE²` taps each, row-major.
    pub(crate) conv_weight: Vec<f32>,
    pub(crate) conv_bias: Vec<f32>,
    pub(crate) fc1: DenseLayer,
    pub(crate) fc2: DenseLayer,
    pub(crate) fc3_weight: DVector<f32>,
    pub(crate) fc3_bias: f32,
}

/// Flat tensors in the order of [`TENSOR_SHAPES`].
pub struct RawTensors {
    pub conv_weight: Vec<f32>,
    pub conv_bias: Vec<f32>,
    pub fc1_weight: Vec<f32>,
    pub fc1_bias: Vec<f32>,
    pub fc2_weight: Vec<f32>,
    pub fc2_bias: Vec<f32>,
    pub fc3_weight: Vec<f32>,
    pub fc3_bias: Vec<f32>,
}

fn check_len(name: &'static str, data: &[f32]) -> Result<(), ModelError> {
    let expected = expected_shape(name);
    let want: usize = expected.iter().product();
    if data.len() != want {
        return Err(ModelError::Shape {
            name,
            expected: expected.to_vec(),
            actual: vec![data.len()],
        });
    }
    Ok(())
}

fn expected_shape(name: &str) -> &'static [usize] {
    TENSOR_SHAPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, s)| *s)
        .unwrap_or(&[])
}

impl ModelWeights {
    /// Build weights from flat row-major tensors, validating element counts.
    pub fn from_raw(raw: RawTensors) -> Result<Self, ModelError> {
        check_len(CONV_WEIGHT, &raw.conv_weight)?;
        check_len(CONV_BIAS, &raw.conv_bias)?;
        check_len(FC1_WEIGHT, &raw.fc1_weight)?;
        check_len(FC1_BIAS, &raw.fc1_bias)?;
        check_len(FC2_WEIGHT, &raw.fc2_weight)?;
        check_len(FC2_BIAS, &raw.fc2_bias)?;
        check_len(FC3_WEIGHT, &raw.fc3_weight)?;
        check_len(FC3_BIAS, &raw.fc3_bias)?;
        Ok(Self {
            conv_weight: raw.conv_weight,
            conv_bias: raw.conv_bias,
            fc1: DenseLayer {
                weight: DMatrix::from_row_slice(HIDDEN, FEATURES, &raw.fc1_weight),
                bias: DVector::from_vec(raw.fc1_bias),
            },
            fc2: DenseLayer {
                weight: DMatrix::from_row_slice(HIDDEN, HIDDEN, &raw.fc2_weight),
                bias: DVector::from_vec(raw.fc2_bias),
            },
            fc3_weight: DVector::from_vec(raw.fc3_weight),
            fc3_bias: raw.fc3_bias[0],
        })
    }

    /// Parse a `safetensors` buffer.
    pub fn from_safetensors(bytes: &[u8]) -> Result<Self, ModelError> {
        let tensors =
            SafeTensors::deserialize(bytes).map_err(|e| ModelError::Format(e.to_string()))?;
        let read = |name: &'static str| read_tensor(&tensors, name);
        Self::from_raw(RawTensors {
            conv_weight: read(CONV_WEIGHT)?,
            conv_bias: read(CONV_BIAS)?,
            fc1_weight: read(FC1_WEIGHT)?,
            fc1_bias: read(FC1_BIAS)?,
            fc2_weight: read(FC2_WEIGHT)?,
            fc2_bias: read(FC2_BIAS)?,
            fc3_weight: read(FC3_WEIGHT)?,
            fc3_bias: read(FC3_BIAS)?,
        })
    }

    /// Read and parse the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_safetensors(&bytes)
    }

    /// Taps of convolution kernel `k`.
    #[inline]
    pub(crate) fn kernel(&self, k: usize) -> &[f32] {
        let n = KERNEL_SIZE * KERNEL_SIZE;
        &self.conv_weight[k * n..(k + 1) * n]
    }
}

fn read_tensor(tensors: &SafeTensors<'_>, name: &'static str) -> Result<Vec<f32>, ModelError> {
    let view = tensors
        .tensor(name)
        .map_err(|_| ModelError::MissingTensor(name))?;
    if view.dtype() != Dtype::F32 {
        return Err(ModelError::Dtype {
            name,
            dtype: format!("{:?}", view.dtype()),
        });
    }
    let expected = expected_shape(name);
    if view.shape() != expected {
        return Err(ModelError::Shape {
            name,
            expected: expected.to_vec(),
            actual: view.shape().to_vec(),
        });
    }
    Ok(view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
