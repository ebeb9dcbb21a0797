//! Detection configuration
//!
//! The constants below encode the framing and lighting assumptions the
//! detector relies on: one vehicle, roughly centered, wheels in the lower
//! half of the frame.

use crate::error::DetectionError;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Working width every input is resampled to.
pub const TARGET_WIDTH: u32 = 800;

/// CLAHE clip limit, relative to a uniform histogram.
pub const CLAHE_CLIP_LIMIT: f64 = 2.0;
/// CLAHE tile grid as (columns, rows).
pub const CLAHE_TILE_GRID: (u32, u32) = (8, 8);

/// Bilateral filter neighbourhood diameter.
pub const BILATERAL_DIAMETER: u32 = 9;
pub const BILATERAL_SIGMA_SPACE: f64 = 75.0;
pub const BILATERAL_SIGMA_COLOR: f64 = 75.0;

/// Adaptive threshold window (odd).
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;
/// Subtracted from the local mean before comparison.
pub const THRESHOLD_OFFSET: i32 = 2;

pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Minimum contour area as a fraction of the frame area (exclusive).
pub const MIN_AREA_FRACTION: f64 = 0.01;
/// Centroids must lie strictly below `height * MIDLINE_FRACTION`.
pub const MIDLINE_FRACTION: f64 = 0.5;
/// Fewest contour points an ellipse is fitted to.
pub const MIN_FIT_POINTS: usize = wheelscan_core::geometry::MIN_FIT_POINTS;
/// At most this many wheels are reported.
pub const MAX_WHEELS: usize = 2;

pub const ELLIPSE_COLOR: [u8; 3] = [0, 255, 0];
pub const ELLIPSE_THICKNESS: u32 = 4;
pub const CENTER_COLOR: [u8; 3] = [255, 0, 0];
pub const CENTER_RADIUS: u32 = 2;
pub const CENTER_THICKNESS: u32 = 3;

/// Main detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub normalize: NormalizeConfig,
    pub contrast: ContrastConfig,
    pub denoise: DenoiseConfig,
    pub binarize: BinarizeConfig,
    pub edges: EdgeConfig,
    pub selection: SelectionConfig,
    pub annotation: AnnotationConfig,
    pub output_dir: PathBuf,
    pub save_intermediate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub target_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    pub clip_limit: f64,
    pub tile_grid: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    pub diameter: u32,
    pub sigma_space: f64,
    pub sigma_color: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    pub block_size: u32,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

/// Region selection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub min_area_fraction: f64,
    pub midline_fraction: f64,
    pub min_fit_points: usize,
    pub max_wheels: usize,
}

/// Annotation style, colors in RGB order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub ellipse_color: [u8; 3],
    pub ellipse_thickness: u32,
    pub center_color: [u8; 3],
    pub center_radius: u32,
    pub center_thickness: u32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_width: TARGET_WIDTH,
        }
    }
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            clip_limit: CLAHE_CLIP_LIMIT,
            tile_grid: CLAHE_TILE_GRID,
        }
    }
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            diameter: BILATERAL_DIAMETER,
            sigma_space: BILATERAL_SIGMA_SPACE,
            sigma_color: BILATERAL_SIGMA_COLOR,
        }
    }
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            block_size: THRESHOLD_BLOCK_SIZE,
            offset: THRESHOLD_OFFSET,
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: CANNY_LOW,
            high_threshold: CANNY_HIGH,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_area_fraction: MIN_AREA_FRACTION,
            midline_fraction: MIDLINE_FRACTION,
            min_fit_points: MIN_FIT_POINTS,
            max_wheels: MAX_WHEELS,
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            ellipse_color: ELLIPSE_COLOR,
            ellipse_thickness: ELLIPSE_THICKNESS,
            center_color: CENTER_COLOR,
            center_radius: CENTER_RADIUS,
            center_thickness: CENTER_THICKNESS,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            contrast: ContrastConfig::default(),
            denoise: DenoiseConfig::default(),
            binarize: BinarizeConfig::default(),
            edges: EdgeConfig::default(),
            selection: SelectionConfig::default(),
            annotation: AnnotationConfig::default(),
            output_dir: ".".into(),
            save_intermediate: true,
        }
    }
}

impl DetectionConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(DetectionError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    /// Reject parameter combinations the stages cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid =
            |msg: String| -> Result<()> { Err(DetectionError::InvalidConfig(msg).into()) };

        if self.normalize.target_width == 0 {
            return invalid("target_width must be positive".into());
        }
        let (cols, rows) = self.contrast.tile_grid;
        if cols == 0 || rows == 0 {
            return invalid(format!("tile_grid must be positive, got {cols}x{rows}"));
        }
        if !(self.contrast.clip_limit > 0.0) {
            let clip = self.contrast.clip_limit;
            return invalid(format!("clip_limit must be positive, got {clip}"));
        }
        if self.denoise.diameter == 0 {
            return invalid("diameter must be positive".into());
        }
        if !(self.denoise.sigma_space > 0.0 && self.denoise.sigma_color > 0.0) {
            return invalid("bilateral sigmas must be positive".into());
        }
        let block = self.binarize.block_size;
        if block < 3 || block % 2 == 0 {
            return invalid(format!("block_size must be odd and >= 3, got {block}"));
        }
        let (low, high) = (self.edges.low_threshold, self.edges.high_threshold);
        if !(low >= 0.0 && low <= high) {
            return invalid(format!(
                "edge thresholds must satisfy 0 <= low <= high, got {low}/{high}"
            ));
        }
        for (name, value) in [
            ("min_area_fraction", self.selection.min_area_fraction),
            ("midline_fraction", self.selection.midline_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {value}"));
            }
        }
        if self.selection.min_fit_points < MIN_FIT_POINTS {
            return invalid(format!(
                "min_fit_points must be at least {MIN_FIT_POINTS}, got {}",
                self.selection.min_fit_points
            ));
        }
        if self.selection.max_wheels == 0 {
            return invalid("max_wheels must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() -> Result<()> {
        let config = DetectionConfig::default();
        config.validate()?;
        assert_eq!(config.normalize.target_width, 800);
        assert_eq!(config.selection.max_wheels, 2);
        Ok(())
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<()> {
        let config = DetectionConfig::from_json_str(
            r#"{ "normalize": { "target_width": 640 }, "save_intermediate": false }"#,
        )?;
        assert_eq!(config.normalize.target_width, 640);
        assert!(!config.save_intermediate);
        assert_eq!(config.binarize, BinarizeConfig::default());
        Ok(())
    }

    #[test]
    fn test_even_block_size_rejected() {
        let mut config = DetectionConfig::default();
        config.binarize.block_size = 10;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = DetectionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_file() -> Result<()> {
        let path =
            std::env::temp_dir().join(format!("wheelscan-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "selection": { "max_wheels": 4 } }"#)?;
        let loaded = DetectionConfig::from_json_file(&path);
        std::fs::remove_file(&path)?;

        let config = loaded?;
        assert_eq!(config.selection.max_wheels, 4);
        assert_eq!(config.edges, EdgeConfig::default());
        Ok(())
    }

    #[test]
    fn test_missing_config_file_reports_path() {
        let path = std::env::temp_dir().join("wheelscan-no-such-config.json");
        let err = DetectionConfig::from_json_file(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to read config"), "{message}");
        assert!(message.contains("wheelscan-no-such-config.json"), "{message}");
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_invalid_config_file_keeps_cause() -> Result<()> {
        let path = std::env::temp_dir()
            .join(format!("wheelscan-bad-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "binarize": { "block_size": 4 } }"#)?;
        let loaded = DetectionConfig::from_json_file(&path);
        std::fs::remove_file(&path)?;

        let err = loaded.unwrap_err();
        assert!(format!("{err:#}").contains("Invalid config file"));
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::InvalidConfig(_))
        ));
        Ok(())
    }

    #[test]
    fn test_round_trip_through_json() -> Result<()> {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config)?;
        assert_eq!(DetectionConfig::from_json_str(&json)?, config);
        Ok(())
    }
}
