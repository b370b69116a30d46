//! JSON runtime configuration for the `perceptual-compress` binary.
//!
//! ```json
//! {
//!   "model": "models/cnniqa.safetensors",
//!   "params": { "selection": { "extremes_per_side": 3 } },
//!   "task": { "file": { "input": "in.png", "output": "out.jpg", "report_json": "report.json" } }
//! }
//! ```
//!
//! A job task instead names a storage root and the raw queue payload:
//! `"task": { "job": { "storage_root": "data", "payload": { ... } } }`.
use crate::compressor::CompressParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Quality model artifact (`safetensors`).
    pub model: PathBuf,
    #[serde(default)]
    pub params: CompressParams,
    pub task: TaskConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskConfig {
    /// Compress one image file.
    File(FileTaskConfig),
    /// Run one queue job against a filesystem object store.
    Job(JobTaskConfig),
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileTaskConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JobTaskConfig {
    /// Directory acting as the object-store bucket.
    pub storage_root: PathBuf,
    /// Job data exactly as delivered by the queue.
    pub payload: serde_json::Value,
    #[serde(default)]
    pub progress_channel: Option<String>,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(data: &str) -> Result<RuntimeConfig, serde_json::Error> {
    serde_json::from_str(data)
}
