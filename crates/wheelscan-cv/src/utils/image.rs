//! Image codec helpers built on the `image` crate

use crate::error::DetectionError;
use crate::Result;
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Image loading and saving helpers
pub struct ImageUtils;

impl ImageUtils {
    /// Decode any supported raster file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| DetectionError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::EmptyImage {
                width: image.width(),
                height: image.height(),
            }
            .into());
        }
        Ok(image)
    }

    /// Decode a file as 8-bit RGB, dropping any alpha channel.
    pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
        Ok(Self::load(path)?.to_rgb8())
    }

    /// Encode `image` with the format implied by the file extension.
    pub fn save_rgb<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
        let path = path.as_ref();
        image.save(path).map_err(|source| DetectionError::Save {
            stage: "annotated",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_load_error() {
        let err = ImageUtils::load_rgb("/nonexistent/wheelscan/car.jpg").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::Load { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_load_error() -> Result<()> {
        let path =
            std::env::temp_dir().join(format!("wheelscan-corrupt-{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png")?;

        let err = ImageUtils::load_rgb(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::Load { .. })
        ));
        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_png_round_trip_keeps_pixels() -> Result<()> {
        let path = std::env::temp_dir().join(format!("wheelscan-rt-{}.png", std::process::id()));
        let image = RgbImage::from_fn(6, 4, |x, y| image::Rgb([x as u8 * 40, y as u8 * 60, 7]));

        ImageUtils::save_rgb(&image, &path)?;
        assert_eq!(ImageUtils::load_rgb(&path)?, image);
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
