//! Dual-threshold gradient edges

use image::GrayImage;
use imageproc::edges::canny;

/// Thin, hysteresis-linked boundary curves of a binary mask.
///
/// The mask is smoothed with a σ = 1.4 Gaussian before gradients are taken,
/// which rounds off isolated one-pixel specks in the mask.
pub fn detect_edges(binary: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    if binary.width() == 0 || binary.height() == 0 {
        return binary.clone();
    }
    canny(binary, low_threshold, high_threshold)
}
