use perceptual_compress::model::weights::TENSOR_SHAPES;
use perceptual_compress::model::{ModelWeights, QualityModel, RawTensors};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use safetensors::tensor::TensorView;
use safetensors::Dtype;
use std::collections::HashMap;

/// Pseudo-random tensors with the network's shapes. `fc3.bias` is set to
/// `output_bias` so scores land near a known value. Seeded, so every run
/// sees the same weights.
pub fn synthetic_tensors(seed: u64, output_bias: f32) -> HashMap<&'static str, Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    TENSOR_SHAPES
        .iter()
        .map(|(name, shape)| {
            let len: usize = shape.iter().product();
            let scale = 1.0 / (shape.last().copied().unwrap_or(1) as f32).sqrt();
            let data = if *name == "fc3.bias" {
                vec![output_bias]
            } else {
                (0..len).map(|_| rng.gen_range(-1.0f32..1.0) * scale).collect()
            };
            (*name, data)
        })
        .collect()
}

pub fn synthetic_model(seed: u64, output_bias: f32) -> QualityModel {
    let mut t = synthetic_tensors(seed, output_bias);
    let mut take = |name: &str| t.remove(name).expect("tensor present");
    let raw = RawTensors {
        conv_weight: take("conv1.weight"),
        conv_bias: take("conv1.bias"),
        fc1_weight: take("fc1.weight"),
        fc1_bias: take("fc1.bias"),
        fc2_weight: take("fc2.weight"),
        fc2_bias: take("fc2.bias"),
        fc3_weight: take("fc3.weight"),
        fc3_bias: take("fc3.bias"),
    };
    QualityModel::new(ModelWeights::from_raw(raw).expect("valid synthetic weights"))
}

/// Serialize tensors into a `safetensors` artifact. Shapes come from
/// `shapes` when given, otherwise from the network definition.
pub fn safetensors_bytes(
    tensors: &HashMap<&'static str, Vec<f32>>,
    shapes: &HashMap<&'static str, Vec<usize>>,
) -> Vec<u8> {
    let bytes: Vec<(&str, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, data)| {
            let shape = shapes.get(name).cloned().unwrap_or_else(|| {
                TENSOR_SHAPES
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, s)| s.to_vec())
                    .unwrap_or_else(|| vec![data.len()])
            });
            let raw = data.iter().flat_map(|v| v.to_le_bytes()).collect();
            (*name, shape, raw)
        })
        .collect();
    let views = bytes.iter().map(|(name, shape, raw)| {
        (
            name.to_string(),
            TensorView::new(Dtype::F32, shape.clone(), raw).expect("consistent view"),
        )
    });
    safetensors::serialize(views, &None).expect("serialize tensors")
}
