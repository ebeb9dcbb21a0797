//! Wheel detector running the full stage sequence

use super::config::DetectionConfig;
use super::selector::{RegionSelector, SelectionStats, WheelEllipse};
use crate::snapshot::{Stage, StageImage};
use crate::stages;
use crate::traits::SnapshotSink;
use crate::utils::{annotate, ImageUtils};
use crate::Result;
use anyhow::Context;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Detection result
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// Normalized frame with the wheel annotations drawn on it.
    #[serde(skip)]
    pub annotated: RgbImage,
    /// Fitted wheels in drawing order, at most `max_wheels`.
    pub wheels: Vec<WheelEllipse>,
    pub stats: DetectionStats,
}

/// Detection statistics
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    pub frame_width: u32,
    pub frame_height: u32,
    pub selection: SelectionStats,
    pub ellipses_drawn: usize,
    pub processing_time_ms: u64,
}

/// Main wheel detector
pub struct WheelDetector {
    config: DetectionConfig,
    selector: RegionSelector,
}

impl WheelDetector {
    /// Create new detector, rejecting unusable parameters.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        let selector = RegionSelector::new(config.selection.clone());
        Ok(Self { config, selector })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Load `image_path` and detect on it.
    ///
    /// A missing or undecodable file fails before any stage runs, so the
    /// sink never sees a snapshot.
    pub fn detect_from_file<P: AsRef<Path>>(
        &self,
        image_path: P,
        sink: &mut dyn SnapshotSink,
    ) -> Result<DetectionResult> {
        let image = ImageUtils::load_rgb(&image_path)
            .with_context(|| format!("Failed to load image: {:?}", image_path.as_ref()))?;
        self.detect_from_rgb_image(&image, sink)
    }

    pub fn detect_from_image(
        &self,
        image: &DynamicImage,
        sink: &mut dyn SnapshotSink,
    ) -> Result<DetectionResult> {
        self.detect_from_rgb_image(&image.to_rgb8(), sink)
    }

    /// Core detection over an RGB frame
    pub fn detect_from_rgb_image(
        &self,
        image: &RgbImage,
        sink: &mut dyn SnapshotSink,
    ) -> Result<DetectionResult> {
        let start_time = Instant::now();
        let cfg = &self.config;

        let resized = stages::normalize(image, cfg.normalize.target_width)?;
        let (width, height) = resized.dimensions();
        debug!(from = ?image.dimensions(), to = ?(width, height), "normalized");
        self.snapshot(sink, Stage::Resized, StageImage::Color(&resized))?;

        let gray = stages::to_luma(&resized);
        self.snapshot(sink, Stage::Gray, StageImage::Gray(&gray))?;

        let enhanced =
            stages::equalize_clahe(&gray, cfg.contrast.clip_limit, cfg.contrast.tile_grid);
        self.snapshot(sink, Stage::Contrast, StageImage::Gray(&enhanced))?;

        let denoised = stages::bilateral_filter(
            &enhanced,
            cfg.denoise.diameter,
            cfg.denoise.sigma_color,
            cfg.denoise.sigma_space,
        );
        self.snapshot(sink, Stage::Denoised, StageImage::Gray(&denoised))?;

        let binary = stages::adaptive_threshold_gaussian(
            &denoised,
            cfg.binarize.block_size,
            cfg.binarize.offset,
        );
        self.snapshot(sink, Stage::Binary, StageImage::Gray(&binary))?;

        let edges =
            stages::detect_edges(&binary, cfg.edges.low_threshold, cfg.edges.high_threshold);
        self.snapshot(sink, Stage::Edges, StageImage::Gray(&edges))?;

        let contours = RegionSelector::extract_contours(&edges);
        let selection = self.selector.select(contours, width, height);
        let wheels = self.selector.fit(&selection.candidates);

        let annotated = annotate(&resized, &wheels, &cfg.annotation);
        self.snapshot(sink, Stage::Annotated, StageImage::Color(&annotated))?;

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            wheels = wheels.len(),
            candidates = selection.stats.selected,
            elapsed_ms = processing_time_ms,
            "wheel detection finished"
        );

        let stats = DetectionStats {
            frame_width: width,
            frame_height: height,
            selection: selection.stats,
            ellipses_drawn: wheels.len(),
            processing_time_ms,
        };

        Ok(DetectionResult {
            annotated,
            wheels,
            stats,
        })
    }

    fn snapshot(
        &self,
        sink: &mut dyn SnapshotSink,
        stage: Stage,
        image: StageImage<'_>,
    ) -> Result<()> {
        if stage.is_intermediate() && !self.config.save_intermediate {
            return Ok(());
        }
        sink.record(stage, image)
            .with_context(|| format!("Failed to record {stage} snapshot"))
    }

    /// Write the annotated frame to `output_path`.
    pub fn save_annotated(&self, result: &DetectionResult, output_path: &Path) -> Result<()> {
        ImageUtils::save_rgb(&result.annotated, output_path)
            .with_context(|| format!("Failed to save annotated image: {:?}", output_path))
    }

    /// Export detection results in JSON format
    pub fn export_json(&self, result: &DetectionResult, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(result)
            .context("Failed to serialize detection results")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MemorySink, NoSnapshots};

    #[test]
    fn test_detector_creation() -> Result<()> {
        let config = DetectionConfig::default();
        let _detector = WheelDetector::new(config)?;
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DetectionConfig::default();
        config.normalize.target_width = 0;
        assert!(WheelDetector::new(config).is_err());
    }

    #[test]
    fn test_all_stages_recorded_in_order() -> Result<()> {
        let detector = WheelDetector::new(DetectionConfig::default())?;
        let mut sink = MemorySink::new();
        let image = RgbImage::from_pixel(160, 120, image::Rgb([180, 180, 180]));

        let result = detector.detect_from_rgb_image(&image, &mut sink)?;

        assert_eq!(sink.stages(), Stage::ALL.to_vec());
        assert_eq!(result.annotated.dimensions(), (800, 600));
        for stage in Stage::ALL {
            let snap = sink.get(stage).map(|img| (img.width(), img.height()));
            assert_eq!(snap, Some((800, 600)), "{stage}");
        }
        Ok(())
    }

    #[test]
    fn test_intermediate_snapshots_can_be_disabled() -> Result<()> {
        let config = DetectionConfig {
            save_intermediate: false,
            ..Default::default()
        };
        let detector = WheelDetector::new(config)?;
        let mut sink = MemorySink::new();
        let image = RgbImage::from_pixel(80, 60, image::Rgb([90, 90, 90]));

        detector.detect_from_rgb_image(&image, &mut sink)?;
        assert_eq!(sink.stages(), vec![Stage::Annotated]);
        Ok(())
    }

    #[test]
    fn test_blank_frame_has_no_wheels() -> Result<()> {
        let detector = WheelDetector::new(DetectionConfig::default())?;
        let frame = RgbImage::from_pixel(200, 100, image::Rgb([240, 240, 240]));
        let image = DynamicImage::ImageRgb8(frame);

        let result = detector.detect_from_image(&image, &mut NoSnapshots)?;
        assert!(result.wheels.is_empty());
        assert_eq!(result.stats.ellipses_drawn, 0);
        assert_eq!(result.stats.selection.contours, 0);
        Ok(())
    }

    #[test]
    fn test_export_json() -> Result<()> {
        let detector = WheelDetector::new(DetectionConfig::default())?;
        let image = RgbImage::from_pixel(100, 50, image::Rgb([10, 10, 10]));
        let result = detector.detect_from_rgb_image(&image, &mut NoSnapshots)?;

        let path =
            std::env::temp_dir().join(format!("wheelscan-report-{}.json", std::process::id()));
        detector.export_json(&result, &path)?;

        let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(report["stats"]["frame_width"], 800);
        assert_eq!(report["stats"]["frame_height"], 400);
        assert!(report["wheels"].as_array().is_some_and(|w| w.is_empty()));
        assert!(report.get("annotated").is_none());
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
