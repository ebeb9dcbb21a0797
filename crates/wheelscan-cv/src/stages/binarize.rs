//! Locally adaptive, inverted binarization
//!
//! The local threshold is a Gaussian-weighted mean of a square window minus
//! a constant offset. Pixels at or below it become foreground (255), so dark
//! tyres and wheel wells light up against brighter bodywork.

use image::{GrayImage, ImageBuffer, Luma};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Normalized 1-D Gaussian taps for an odd `size`, using the conventional
/// sigma for a kernel of that size.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) as i32;
    let sigma = 0.3 * ((size - 1) as f64 * 0.5 - 1.0) + 0.8;
    let half = size / 2;
    let taps: Vec<f64> = (-half..=half)
        .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = taps.iter().sum();
    taps.into_iter().map(|t| (t / total) as f32).collect()
}

/// Separable Gaussian mean with replicated borders.
fn local_mean(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (w, h) = image.dimensions();
    let half = (kernel.len() / 2) as i32;
    let (max_x, max_y) = (w as i32 - 1, h as i32 - 1);

    let horizontal: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_fn(w, h, |x, y| {
        let acc = kernel.iter().enumerate().fold(0.0, |acc, (k, &t)| {
            let sx = (x as i32 + k as i32 - half).clamp(0, max_x) as u32;
            acc + t * image.get_pixel(sx, y)[0] as f32
        });
        Luma([acc])
    });

    GrayImage::from_fn(w, h, |x, y| {
        let acc = kernel.iter().enumerate().fold(0.0, |acc, (k, &t)| {
            let sy = (y as i32 + k as i32 - half).clamp(0, max_y) as u32;
            acc + t * horizontal.get_pixel(x, sy)[0]
        });
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Inverted adaptive threshold: foreground where
/// `pixel <= gaussian_mean(block_size) - offset`.
pub fn adaptive_threshold_gaussian(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let mean = local_mean(image, &gaussian_kernel(block_size));
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y)[0] as i32;
        let threshold = mean.get_pixel(x, y)[0] as i32 - offset;
        Luma([if pixel <= threshold { FOREGROUND } else { BACKGROUND }])
    })
}
