//! Collaborator seams around a job: object storage, status store and the
//! progress channel.
//!
//! Production transports (S3, Postgres, Redis) live outside this crate and
//! implement these traits. The crate ships a filesystem object store, an
//! in-memory store and a reporter that forwards status and progress to `log`.
use super::JobError;
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

/// Byte storage addressed by `/`-separated keys.
pub trait ObjectStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Vec<u8>, JobError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), JobError>;
}

/// Lifecycle states written to the status store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        })
    }
}

pub trait StatusStore: Send + Sync {
    fn update_status(&self, image_id: &str, status: JobStatus) -> Result<(), JobError>;
}

pub trait ProgressChannel: Send + Sync {
    fn publish(&self, channel: &str, message: &str) -> Result<(), JobError>;
}

/// Object store rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `key` below the root, refusing absolute or parent components.
    fn resolve(&self, key: &str) -> Result<PathBuf, JobError> {
        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(JobError::Storage {
                key: key.to_owned(),
                reason: "key must be a relative path without `..`".into(),
            });
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, JobError> {
        let path = self.resolve(key)?;
        fs::read(&path).map_err(|e| JobError::Storage {
            key: key.to_owned(),
            reason: e.to_string(),
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), JobError> {
        let path = self.resolve(key)?;
        let storage_err = |e: std::io::Error| JobError::Storage {
            key: key.to_owned(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(storage_err)?;
        }
        fs::write(&path, bytes).map_err(storage_err)
    }
}

/// Object store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // a poisoned map still holds consistent byte buffers
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, JobError> {
        self.lock().get(key).cloned().ok_or_else(|| JobError::Storage {
            key: key.to_owned(),
            reason: "no such object".into(),
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), JobError> {
        self.lock().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Forwards status updates and progress messages to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl StatusStore for LogReporter {
    fn update_status(&self, image_id: &str, status: JobStatus) -> Result<(), JobError> {
        info!("image {image_id} status={status}");
        Ok(())
    }
}

impl ProgressChannel for LogReporter {
    fn publish(&self, channel: &str, message: &str) -> Result<(), JobError> {
        info!("[{channel}] {message}");
        Ok(())
    }
}
