//! Adaptive compressor orchestrating region selection, scoring and encoding.
//!
//! Overview
//! - Partitions the image into a grid of regions (`regions`).
//! - Ranks regions by Laplacian variance and keeps the blurriest and
//!   sharpest few (`sharpness`).
//! - Scores the kept regions concurrently with the patch quality network
//!   (`scoring`, `patches`, `model`).
//! - Maps the aggregate score to an encoder quality and encodes (`planner`).
//!
//! Modules
//! - [`params`] – configuration types used by the compressor and CLI.
//! - `pipeline` – the main [`AdaptiveCompressor`] implementation.

pub mod params;
mod pipeline;

pub use params::CompressParams;
pub use pipeline::{AdaptiveCompressor, CompressionOutput};
