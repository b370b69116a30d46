//! Boundary layer turning queue jobs into compressed objects.
//!
//! - [`ImageJob`]: typed descriptor parsed from the raw queue payload.
//! - [`ObjectStore`], [`StatusStore`], [`ProgressChannel`]: collaborator
//!   seams with filesystem, in-memory and logging implementations.
//! - [`JobProcessor`]: status `processing` → fetch → decode → compress →
//!   store → status `completed`, or `failed` on the first error.

pub mod descriptor;
pub mod processor;
pub mod store;

pub use descriptor::ImageJob;
pub use processor::{JobOutcome, JobProcessor, DEFAULT_PROGRESS_CHANNEL};
pub use store::{
    FsObjectStore, JobStatus, LogReporter, MemoryObjectStore, ObjectStore, ProgressChannel,
    StatusStore,
};

use crate::error::{CompressError, ImageIoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job payload: {0}")]
    Payload(String),
    #[error("storage error for `{key}`: {reason}")]
    Storage { key: String, reason: String },
    #[error("status store error: {0}")]
    Status(String),
    #[error(transparent)]
    Image(#[from] ImageIoError),
    #[error(transparent)]
    Compress(#[from] CompressError),
}
