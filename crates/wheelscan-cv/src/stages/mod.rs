//! Image stages, in pipeline order
//!
//! Every stage takes its input by reference and returns a new buffer, so
//! each intermediate stays available for inspection.

pub mod binarize;
pub mod contrast;
pub mod denoise;
pub mod edges;
pub mod normalize;

pub use binarize::adaptive_threshold_gaussian;
pub use contrast::{equalize_clahe, to_luma};
pub use denoise::bilateral_filter;
pub use edges::detect_edges;
pub use normalize::{normalize, target_height};
