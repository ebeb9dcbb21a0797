//! High-level detection module

pub mod config;
pub mod detector;
pub mod selector;

pub use config::DetectionConfig;
pub use detector::{DetectionResult, DetectionStats, WheelDetector};
pub use selector::{RegionSelector, Selection, SelectionStats, WheelEllipse};
