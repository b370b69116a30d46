//! Drives one [`ImageJob`] through storage, the compressor and status updates.
use super::descriptor::ImageJob;
use super::store::{JobStatus, ObjectStore, ProgressChannel, StatusStore};
use super::JobError;
use crate::compressor::AdaptiveCompressor;
use crate::diagnostics::QualityTelemetry;
use crate::image::io::decode_image;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Channel used when none is configured.
pub const DEFAULT_PROGRESS_CHANNEL: &str = "image-processor";

/// Result of a successfully processed job.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub destination_key: String,
    pub telemetry: QualityTelemetry,
    pub encoded_bytes: usize,
    pub elapsed_ms: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressMessage<'a> {
    image_id: &'a str,
    message_id: &'a str,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    telemetry: Option<QualityTelemetry>,
}

pub struct JobProcessor {
    compressor: AdaptiveCompressor,
    objects: Arc<dyn ObjectStore>,
    status: Arc<dyn StatusStore>,
    progress: Arc<dyn ProgressChannel>,
    channel: String,
}

impl JobProcessor {
    pub fn new(
        compressor: AdaptiveCompressor,
        objects: Arc<dyn ObjectStore>,
        status: Arc<dyn StatusStore>,
        progress: Arc<dyn ProgressChannel>,
    ) -> Self {
        Self {
            compressor,
            objects,
            status,
            progress,
            channel: DEFAULT_PROGRESS_CHANNEL.to_owned(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Fetch, compress and store the image named by `job`.
    ///
    /// Status moves to `processing` before any work and to `completed` once
    /// the encoded bytes are stored. Any failure after the first status write,
    /// including a failed `completed` write, marks the job `failed` and is
    /// returned unchanged; nothing is retried.
    pub fn process(&self, job: &ImageJob) -> Result<JobOutcome, JobError> {
        let start = Instant::now();
        self.status
            .update_status(job.image_id(), JobStatus::Processing)?;
        let result = self.run(job, start).and_then(|outcome| {
            self.status
                .update_status(job.image_id(), JobStatus::Completed)?;
            Ok(outcome)
        });
        match result {
            Ok(outcome) => {
                self.publish(job, JobStatus::Completed, Some(outcome.telemetry));
                info!(
                    "job {} stored {} ({} bytes, quality {}) in {:.1} ms",
                    job.message_id(),
                    outcome.destination_key,
                    outcome.encoded_bytes,
                    outcome.telemetry.encoder_quality,
                    outcome.elapsed_ms
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("job {} failed: {err}", job.message_id());
                if let Err(status_err) = self.status.update_status(job.image_id(), JobStatus::Failed)
                {
                    warn!("could not mark {} failed: {status_err}", job.image_id());
                }
                self.publish(job, JobStatus::Failed, None);
                Err(err)
            }
        }
    }

    fn run(&self, job: &ImageJob, start: Instant) -> Result<JobOutcome, JobError> {
        let source = job.source_key();
        let bytes = self.objects.get(&source)?;
        debug!("job {} fetched {source} ({} bytes)", job.message_id(), bytes.len());

        let image = decode_image(&bytes)?;
        let out = self.compressor.compress_with_diagnostics(image.as_view())?;

        let destination_key = job.destination_key();
        self.objects.put(&destination_key, &out.encoded.bytes)?;

        Ok(JobOutcome {
            destination_key,
            telemetry: out.report.telemetry(),
            encoded_bytes: out.encoded.bytes.len(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Progress is best effort; a failed publish is logged, never fatal.
    fn publish(&self, job: &ImageJob, status: JobStatus, telemetry: Option<QualityTelemetry>) {
        let message = ProgressMessage {
            image_id: job.image_id(),
            message_id: job.message_id(),
            status: status.to_string(),
            telemetry,
        };
        let result = serde_json::to_string(&message)
            .map_err(|e| JobError::Payload(e.to_string()))
            .and_then(|json| self.progress.publish(&self.channel, &json));
        if let Err(err) = result {
            warn!("progress publish on {} failed: {err}", self.channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::CompressParams;
    use crate::job::MemoryObjectStore;
    use crate::model::weights::*;
    use crate::model::{ModelWeights, QualityModel};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<(String, JobStatus)>>,
        messages: Mutex<Vec<(String, String)>>,
    }

    impl StatusStore for Recorder {
        fn update_status(&self, image_id: &str, status: JobStatus) -> Result<(), JobError> {
            self.statuses
                .lock()
                .unwrap()
                .push((image_id.to_owned(), status));
            Ok(())
        }
    }

    impl ProgressChannel for Recorder {
        fn publish(&self, channel: &str, message: &str) -> Result<(), JobError> {
            self.messages
                .lock()
                .unwrap()
                .push((channel.to_owned(), message.to_owned()));
            Ok(())
        }
    }

    fn constant_model(score: f32) -> Arc<QualityModel> {
        let zeros = |name: &str| {
            let len = TENSOR_SHAPES
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, s)| s.iter().product::<usize>())
                .unwrap();
            vec![0.0f32; len]
        };
        let raw = RawTensors {
            conv_weight: zeros(CONV_WEIGHT),
            conv_bias: zeros(CONV_BIAS),
            fc1_weight: zeros(FC1_WEIGHT),
            fc1_bias: zeros(FC1_BIAS),
            fc2_weight: zeros(FC2_WEIGHT),
            fc2_bias: zeros(FC2_BIAS),
            fc3_weight: zeros(FC3_WEIGHT),
            fc3_bias: vec![score],
        };
        Arc::new(QualityModel::new(ModelWeights::from_raw(raw).unwrap()))
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = ::image::GrayImage::from_fn(w, h, |x, y| {
            ::image::Luma([((x * 7 + y * 3) % 256) as u8])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn job() -> ImageJob {
        ImageJob::from_payload(&json!({
            "pattern": "image.uploaded",
            "message": { "image_id": "img", "filename": "pic.png", "user_id": "u1", "message_id": "m1" }
        }))
        .unwrap()
    }

    fn processor(
        model: Arc<QualityModel>,
        objects: Arc<MemoryObjectStore>,
        recorder: Arc<Recorder>,
    ) -> JobProcessor {
        let compressor = AdaptiveCompressor::new(model, CompressParams::default());
        JobProcessor::new(compressor, objects, recorder.clone(), recorder)
    }

    #[test]
    fn successful_job_stores_output_and_completes() {
        let objects = Arc::new(MemoryObjectStore::new());
        objects
            .put("uploads/u1/img/pic.png", &png_bytes(256, 256))
            .unwrap();
        let recorder = Arc::new(Recorder::default());
        let jobs = processor(constant_model(55.0), objects.clone(), recorder.clone());

        let outcome = jobs.process(&job()).unwrap();
        assert_eq!(outcome.destination_key, "resized/u1/img/pic.png");
        assert_eq!(outcome.telemetry.encoder_quality, 55);
        assert_eq!(outcome.telemetry.regions_selected, 6);
        let stored = objects.get("resized/u1/img/pic.png").unwrap();
        assert_eq!(&stored[..2], &[0xFF, 0xD8]);

        let statuses = recorder.statuses.lock().unwrap();
        assert_eq!(
            statuses.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            vec![JobStatus::Processing, JobStatus::Completed]
        );
        let messages = recorder.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, DEFAULT_PROGRESS_CHANNEL);
        assert!(messages[0].1.contains("\"encoderQuality\":55"));
    }

    #[test]
    fn missing_source_marks_job_failed() {
        let objects = Arc::new(MemoryObjectStore::new());
        let recorder = Arc::new(Recorder::default());
        let jobs = processor(constant_model(10.0), objects.clone(), recorder.clone())
            .with_channel("custom");

        let err = jobs.process(&job()).unwrap_err();
        assert!(matches!(err, JobError::Storage { .. }));
        assert!(objects.keys().is_empty());
        let statuses = recorder.statuses.lock().unwrap();
        assert_eq!(statuses.last().map(|(_, s)| *s), Some(JobStatus::Failed));
        assert_eq!(recorder.messages.lock().unwrap()[0].0, "custom");
    }

    /// Status store whose `completed` write is refused.
    #[derive(Default)]
    struct RefusesCompleted {
        inner: Recorder,
    }

    impl StatusStore for RefusesCompleted {
        fn update_status(&self, image_id: &str, status: JobStatus) -> Result<(), JobError> {
            if status == JobStatus::Completed {
                return Err(JobError::Status("status backend unavailable".into()));
            }
            self.inner.update_status(image_id, status)
        }
    }

    #[test]
    fn failed_completed_write_marks_job_failed() {
        let objects = Arc::new(MemoryObjectStore::new());
        objects
            .put("uploads/u1/img/pic.png", &png_bytes(256, 256))
            .unwrap();
        let status = Arc::new(RefusesCompleted::default());
        let progress = Arc::new(Recorder::default());
        let compressor = AdaptiveCompressor::new(constant_model(40.0), CompressParams::default());
        let jobs = JobProcessor::new(compressor, objects, status.clone(), progress.clone());

        let err = jobs.process(&job()).unwrap_err();
        assert!(matches!(err, JobError::Status(_)));
        let statuses = status.inner.statuses.lock().unwrap();
        assert_eq!(
            statuses.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            vec![JobStatus::Processing, JobStatus::Failed]
        );
        let messages = progress.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].1.contains("\"status\":\"failed\""));
    }

    #[test]
    fn undecodable_source_is_an_image_error() {
        let objects = Arc::new(MemoryObjectStore::new());
        objects.put("uploads/u1/img/pic.png", b"not an image").unwrap();
        let recorder = Arc::new(Recorder::default());
        let jobs = processor(constant_model(10.0), objects, recorder);
        assert!(matches!(jobs.process(&job()), Err(JobError::Image(_))));
    }

    #[test]
    fn tiny_image_fails_with_degenerate_regions() {
        let objects = Arc::new(MemoryObjectStore::new());
        objects
            .put("uploads/u1/img/pic.png", &png_bytes(64, 64))
            .unwrap();
        let recorder = Arc::new(Recorder::default());
        let jobs = processor(constant_model(10.0), objects, recorder);
        assert!(matches!(
            jobs.process(&job()),
            Err(JobError::Compress(
                crate::error::CompressError::AllRegionsDegenerate { .. }
            ))
        ));
    }
}
