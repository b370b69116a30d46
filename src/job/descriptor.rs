//! Typed, immutable description of one compression job.
//!
//! The queue delivers `{ "pattern": ..., "message": ... }` where `message` is
//! either a JSON object or a JSON-encoded string of one, carrying
//! `image_id`, `filename`, `user_id` and `message_id`.
use super::JobError;
use serde::Deserialize;
use serde_json::Value;

/// Prefix of source object keys.
pub const UPLOAD_PREFIX: &str = "uploads";
/// Prefix of destination object keys.
pub const RESIZED_PREFIX: &str = "resized";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct JobMessage {
    image_id: String,
    filename: String,
    user_id: String,
    message_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageJob {
    pattern: Option<String>,
    message: JobMessage,
}

impl ImageJob {
    /// Parse raw job data as delivered by the queue.
    pub fn from_payload(payload: &Value) -> Result<Self, JobError> {
        let pattern = payload
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let raw = payload
            .get("message")
            .ok_or_else(|| JobError::Payload("missing `message`".into()))?;
        let message: JobMessage = match raw {
            Value::String(encoded) => serde_json::from_str(encoded),
            other => serde_json::from_value(other.clone()),
        }
        .map_err(|e| JobError::Payload(format!("bad `message`: {e}")))?;
        for (name, value) in [
            ("image_id", &message.image_id),
            ("filename", &message.filename),
            ("user_id", &message.user_id),
        ] {
            if value.is_empty() {
                return Err(JobError::Payload(format!("empty `{name}`")));
            }
        }
        Ok(Self { pattern, message })
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn image_id(&self) -> &str {
        &self.message.image_id
    }

    pub fn filename(&self) -> &str {
        &self.message.filename
    }

    pub fn user_id(&self) -> &str {
        &self.message.user_id
    }

    pub fn message_id(&self) -> &str {
        &self.message.message_id
    }

    /// `uploads/{user}/{image}/{filename}`
    pub fn source_key(&self) -> String {
        self.key(UPLOAD_PREFIX)
    }

    /// `resized/{user}/{image}/{filename}`
    pub fn destination_key(&self) -> String {
        self.key(RESIZED_PREFIX)
    }

    fn key(&self, prefix: &str) -> String {
        format!(
            "{prefix}/{}/{}/{}",
            self.message.user_id, self.message.image_id, self.message.filename
        )
    }
}
