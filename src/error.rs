//! Error types shared by the compression pipeline.
//!
//! Startup problems (a missing or malformed model artifact) are reported as
//! [`ModelError`]; per-image failures as [`CompressError`]. Neither is retried
//! inside the crate.
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or validate the quality-model weights.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed model artifact: {0}")]
    Format(String),
    #[error("model artifact is missing tensor `{0}`")]
    MissingTensor(&'static str),
    #[error("tensor `{name}` has dtype {dtype}, expected F32")]
    Dtype { name: &'static str, dtype: String },
    #[error("tensor `{name}` has shape {actual:?}, expected {expected:?}")]
    Shape {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Failure while compressing a single image.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("invalid image {width}x{height}x{channels}: {reason}")]
    InvalidImage {
        width: usize,
        height: usize,
        channels: usize,
        reason: &'static str,
    },
    /// Every selected region was smaller than one patch, so no score exists.
    #[error("all {selected} selected regions are smaller than a scoring patch")]
    AllRegionsDegenerate { selected: usize },
    #[error("aggregate quality {0} is not a finite number")]
    NonFiniteQuality(f64),
    #[error("encoder failed at quality {quality}: {reason}")]
    EncodeFailure { quality: u8, reason: String },
}

/// I/O helpers around decoded images and JSON reports.
#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] CompressError),
}

pub type CompressResult<T> = Result<T, CompressError>;
