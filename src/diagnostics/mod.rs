//! Diagnostics produced alongside the encoded image.
//!
//! [`CompressionReport`] records every stage the pipeline ran: the sharpness
//! ranking, the regions chosen for scoring, per-region model scores, the
//! aggregate and the chosen encoder quality, plus stage timings.

pub mod report;
pub mod timing;

pub use report::{CompressionReport, InputDescriptor, QualityTelemetry};
pub use timing::{StageTiming, TimingBreakdown};
