//! Aggregate quality → encoder quality → encoded bytes.
//!
//! The aggregate is fed to the encoder through a single [`QualityMapping`]
//! function. The default, [`literal_quality`], clamps the aggregate to
//! `[0, 100]` and truncates it. Note that the model scores lower for worse
//! images while encoders read higher values as higher fidelity; the literal
//! mapping therefore spends fewer bits on images that already look worse.
//! Swap the mapping to change that policy without touching the pipeline.

pub mod codec;

pub use codec::{ImageEncoder, JpegEncoderBackend};

use crate::error::{CompressError, CompressResult};
use crate::image::ImageU8;
use log::debug;
use serde::Serialize;

/// Maps a finite aggregate quality to an encoder quality in `[0, 100]`.
pub type QualityMapping = fn(f64) -> u8;

/// Clamp to `[0, 100]` then truncate toward zero.
pub fn literal_quality(aggregate: f64) -> u8 {
    aggregate.clamp(0.0, 100.0) as u8
}

/// Encoded output together with the quality that produced it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub format: &'static str,
    pub quality: u8,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Chooses the encoder quality and invokes the codec.
pub struct CompressionPlanner {
    mapping: QualityMapping,
    encoder: Box<dyn ImageEncoder>,
}

impl Default for CompressionPlanner {
    fn default() -> Self {
        Self::new(Box::new(JpegEncoderBackend))
    }
}

impl CompressionPlanner {
    pub fn new(encoder: Box<dyn ImageEncoder>) -> Self {
        Self {
            mapping: literal_quality,
            encoder,
        }
    }

    /// Replace the aggregate → quality mapping.
    pub fn with_mapping(mut self, mapping: QualityMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Encoder quality for `aggregate`, always within `[0, 100]`.
    pub fn encoder_quality(&self, aggregate: f64) -> CompressResult<u8> {
        if !aggregate.is_finite() {
            return Err(CompressError::NonFiniteQuality(aggregate));
        }
        Ok((self.mapping)(aggregate).min(100))
    }

    /// Encode `image` at the quality derived from `aggregate`.
    pub fn compress(&self, image: &ImageU8<'_>, aggregate: f64) -> CompressResult<EncodedImage> {
        let quality = self.encoder_quality(aggregate)?;
        let bytes = self.encoder.encode(image, quality)?;
        debug!(
            "CompressionPlanner::compress aggregate={:.4} quality={} format={} bytes={}",
            aggregate,
            quality,
            self.encoder.format(),
            bytes.len()
        );
        Ok(EncodedImage {
            format: self.encoder.format(),
            quality,
            bytes,
        })
    }
}
