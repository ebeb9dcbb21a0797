//! Edge-preserving bilateral smoothing

use image::{GrayImage, Luma};

/// Bilateral filter over a circular window of the given `diameter`.
///
/// Each neighbour is weighted by a Gaussian of its spatial distance
/// (`sigma_space`) times a Gaussian of its intensity difference
/// (`sigma_color`). Samples outside the frame repeat the border pixel.
pub fn bilateral_filter(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> GrayImage {
    let (w, h) = image.dimensions();
    let radius = (diameter / 2).max(1) as i32;

    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f64;
            if r2.sqrt() <= radius as f64 {
                offsets.push((dx, dy, (r2 * space_coeff).exp() as f32));
            }
        }
    }

    let color_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f64 * color_coeff).exp() as f32)
        .collect();

    let (max_x, max_y) = (w as i32 - 1, h as i32 - 1);
    GrayImage::from_fn(w, h, |x, y| {
        let center = image.get_pixel(x, y)[0];
        let mut sum = 0.0f32;
        let mut norm = 0.0f32;
        for &(dx, dy, space_w) in &offsets {
            let sx = (x as i32 + dx).clamp(0, max_x) as u32;
            let sy = (y as i32 + dy).clamp(0, max_y) as u32;
            let v = image.get_pixel(sx, sy)[0];
            let weight = space_w * color_weights[center.abs_diff(v) as usize];
            sum += weight * v as f32;
            norm += weight;
        }
        Luma([(sum / norm).round().clamp(0.0, 255.0) as u8])
    })
}
