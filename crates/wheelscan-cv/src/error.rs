//! Error types for the detection pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a detection run.
///
/// Degenerate contours and empty results are not errors; they only reduce
/// the number of wheels reported.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to load image {path:?}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("input image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration")]
    Config(#[from] serde_json::Error),

    #[error("failed to save {stage} image to {path:?}")]
    Save {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
