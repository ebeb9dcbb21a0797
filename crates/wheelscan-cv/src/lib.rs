//! Wheelscan Computer Vision Library
//!
//! Locates the two wheel regions in a vehicle photograph through a fixed
//! sequence of image stages, then fits and draws ellipses on them.

pub mod detection;
pub mod error;
pub mod snapshot;
pub mod stages;
pub mod utils;

// Re-export commonly used types
pub use detection::{DetectionConfig, DetectionResult, RegionSelector, WheelDetector, WheelEllipse};
pub use error::DetectionError;
pub use snapshot::{DirectorySink, MemorySink, NoSnapshots, Stage, StageImage};
pub use wheelscan_core::{Candidate, Contour, Ellipse, Moments, Point};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the pipeline
pub mod traits {
    use super::*;

    /// Receiver for the image each stage produces.
    ///
    /// Sinks only observe; nothing they do feeds back into detection.
    pub trait SnapshotSink {
        fn record(&mut self, stage: Stage, image: StageImage<'_>) -> Result<()>;
    }
}
