//! Fixed-width rescaling

use crate::error::DetectionError;
use crate::Result;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Height that keeps the aspect ratio of a `width`×`height` image at
/// `target_width`, rounded to the nearest pixel and never zero.
pub fn target_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (target_width as f64 * height as f64 / width as f64).round();
    (scaled as u32).max(1)
}

/// Resample `image` to `target_width` with bilinear interpolation.
pub fn normalize(image: &RgbImage, target_width: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::EmptyImage { width, height }.into());
    }

    let new_height = target_height(width, height, target_width);
    if (width, height) == (target_width, new_height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, target_width, new_height, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_height_rounds() {
        assert_eq!(target_height(1000, 750, 800), 600);
        assert_eq!(target_height(3, 2, 800), 533);
        assert_eq!(target_height(300, 1, 800), 3);
        assert_eq!(target_height(10_000, 1, 800), 1);
    }

    #[test]
    fn test_normalize_dimensions() -> Result<()> {
        let image = RgbImage::new(1920, 1080);
        let out = normalize(&image, 800)?;
        assert_eq!(out.dimensions(), (800, 450));
        Ok(())
    }

    #[test]
    fn test_upscale_small_image() -> Result<()> {
        let image = RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
        let out = normalize(&image, 800)?;
        assert_eq!(out.dimensions(), (800, 600));
        assert_eq!(out.get_pixel(400, 300), &image::Rgb([10, 20, 30]));
        Ok(())
    }

    #[test]
    fn test_empty_image_rejected() {
        let err = normalize(&RgbImage::new(0, 10), 800).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::EmptyImage { width: 0, height: 10 })
        ));
    }
}
