//! Compression pipeline driving one image end-to-end.
//!
//! The [`AdaptiveCompressor`] exposes a simple API: feed a decoded image and
//! get encoded bytes whose quality setting follows the predicted perceptual
//! quality, optionally with a full diagnostic report.
//!
//! Typical usage:
//! ```no_run
//! use perceptual_compress::{AdaptiveCompressor, CompressParams, QualityModel};
//! use perceptual_compress::image::ImageU8;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example(image: ImageU8) -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(QualityModel::load(Path::new("models/cnniqa.safetensors"))?);
//! let compressor = AdaptiveCompressor::new(model, CompressParams::default());
//! let out = compressor.compress_with_diagnostics(image)?;
//! println!("quality {} -> {} bytes", out.encoded.quality, out.encoded.bytes.len());
//! # Ok(())
//! # }
//! ```
use super::params::CompressParams;
use crate::diagnostics::{CompressionReport, InputDescriptor, TimingBreakdown};
use crate::error::CompressResult;
use crate::image::ImageU8;
use crate::model::QualityModel;
use crate::planner::{CompressionPlanner, EncodedImage};
use crate::regions::{partition, Region};
use crate::scoring::{score_regions, QualityEstimate};
use crate::sharpness::{select_regions, SharpnessScore};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

/// Encoded image plus the report describing how it was produced.
#[derive(Clone, Debug)]
pub struct CompressionOutput {
    pub encoded: EncodedImage,
    pub report: CompressionReport,
}

/// Intermediate results of the estimation stages.
struct Estimation {
    ranked: Vec<SharpnessScore>,
    selected: Vec<Region>,
    quality: QualityEstimate,
}

/// Region-sampled perceptual quality estimation followed by encoding.
pub struct AdaptiveCompressor {
    params: CompressParams,
    model: Arc<QualityModel>,
    planner: CompressionPlanner,
}

impl AdaptiveCompressor {
    /// Create a compressor sharing `model`, encoding JPEG with the literal
    /// quality mapping.
    pub fn new(model: Arc<QualityModel>, params: CompressParams) -> Self {
        Self {
            params,
            model,
            planner: CompressionPlanner::default(),
        }
    }

    /// Replace the planner (encoder backend or quality mapping).
    pub fn with_planner(mut self, planner: CompressionPlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Run the estimation stages only and return the aggregate quality.
    pub fn estimate_quality(&self, image: ImageU8<'_>) -> CompressResult<QualityEstimate> {
        let mut timings = TimingBreakdown::default();
        self.estimate(&image, &mut timings).map(|e| e.quality)
    }

    /// Validate, partition, rank and score `image`, recording stage timings.
    fn estimate(
        &self,
        image: &ImageU8<'_>,
        timings: &mut TimingBreakdown,
    ) -> CompressResult<Estimation> {
        image.validate()?;

        let stage = Instant::now();
        let regions = partition(image.h, image.w, self.params.grid_divisions);
        timings.record_since("partition", stage);

        let stage = Instant::now();
        let (ranked, selected) = select_regions(image, &regions, &self.params.selection);
        timings.record_since("sharpness", stage);

        let stage = Instant::now();
        let quality = score_regions(
            &self.model,
            image,
            &selected,
            &self.params.normalization,
            self.params.parallel,
        )?;
        timings.record_since("scoring", stage);

        Ok(Estimation {
            ranked,
            selected,
            quality,
        })
    }

    /// Compress `image`, returning only the encoded output.
    pub fn compress(&self, image: ImageU8<'_>) -> CompressResult<EncodedImage> {
        self.compress_with_diagnostics(image).map(|out| out.encoded)
    }

    /// Compress `image` and return both the encoded bytes and a report.
    pub fn compress_with_diagnostics(
        &self,
        image: ImageU8<'_>,
    ) -> CompressResult<CompressionOutput> {
        debug!(
            "AdaptiveCompressor::compress start w={} h={} channels={} divisions={}",
            image.w, image.h, image.channels, self.params.grid_divisions
        );
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let Estimation {
            ranked,
            selected,
            quality: estimate,
        } = self.estimate(&image, &mut timings)?;

        let stage = Instant::now();
        let encoded = self.planner.compress(&image, estimate.aggregate)?;
        timings.record_since("encode", stage);

        timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "AdaptiveCompressor::compress done aggregate={:.4} quality={} bytes={} total_ms={:.3}",
            estimate.aggregate,
            encoded.quality,
            encoded.bytes.len(),
            timings.total_ms
        );

        let report = CompressionReport {
            input: InputDescriptor {
                width: image.w,
                height: image.h,
                channels: image.channels,
                grid_divisions: self.params.grid_divisions,
            },
            ranked_regions: ranked,
            selected_regions: selected,
            region_scores: estimate.regions,
            aggregate_quality: estimate.aggregate,
            format: encoded.format,
            encoder_quality: encoded.quality,
            encoded_bytes: encoded.bytes.len(),
            timings,
        };
        Ok(CompressionOutput { encoded, report })
    }
}
