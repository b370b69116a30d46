use super::TimingBreakdown;
use crate::regions::Region;
use crate::scoring::RegionQuality;
use crate::sharpness::SharpnessScore;
use serde::Serialize;

/// Geometry of the image fed to the pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub grid_divisions: usize,
}

/// End-to-end trace of one compression run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub input: InputDescriptor,
    /// All regions in ascending sharpness order.
    pub ranked_regions: Vec<SharpnessScore>,
    pub selected_regions: Vec<Region>,
    pub region_scores: Vec<RegionQuality>,
    pub aggregate_quality: f64,
    pub format: &'static str,
    pub encoder_quality: u8,
    pub encoded_bytes: usize,
    pub timings: TimingBreakdown,
}

impl CompressionReport {
    /// Compact signal for progress reporting.
    pub fn telemetry(&self) -> QualityTelemetry {
        QualityTelemetry {
            aggregate_quality: self.aggregate_quality,
            encoder_quality: self.encoder_quality,
            regions_selected: self.selected_regions.len(),
            regions_scored: self
                .region_scores
                .iter()
                .filter(|r| r.score.is_some())
                .count(),
        }
    }
}

/// Quality signal published to observers once an image is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTelemetry {
    pub aggregate_quality: f64,
    pub encoder_quality: u8,
    pub regions_selected: usize,
    pub regions_scored: usize,
}
