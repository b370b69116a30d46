#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod compressor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod job;
pub mod model;

// Pipeline stages – public so tools can run them individually.
pub mod patches;
pub mod planner;
pub mod regions;
pub mod scoring;
pub mod sharpness;

// --- High-level re-exports -------------------------------------------------

// Main entry points: compressor + parameters + model.
pub use crate::compressor::{AdaptiveCompressor, CompressParams, CompressionOutput};
pub use crate::model::QualityModel;

// Errors.
pub use crate::error::{CompressError, CompressResult, ImageIoError, ModelError};

// Diagnostics returned by the compressor.
pub use crate::diagnostics::{CompressionReport, QualityTelemetry};

// Boundary layer.
pub use crate::job::{ImageJob, JobError, JobProcessor};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use perceptual_compress::prelude::*;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = Arc::new(QualityModel::load(Path::new("models/cnniqa.safetensors"))?);
/// let (w, h) = (640usize, 480usize);
/// let gray = vec![128u8; w * h];
/// let img = ImageU8 { w, h, channels: 1, stride: w, data: &gray };
///
/// let compressor = AdaptiveCompressor::new(model, CompressParams::default());
/// let encoded = compressor.compress(img)?;
/// println!("quality={} bytes={}", encoded.quality, encoded.bytes.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageBufU8, ImageU8};
    pub use crate::{AdaptiveCompressor, CompressError, CompressParams, QualityModel};
}
