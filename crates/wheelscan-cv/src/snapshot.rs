//! Diagnostic snapshots of intermediate stage outputs

use crate::error::DetectionError;
use crate::traits::SnapshotSink;
use crate::Result;
use image::{DynamicImage, GrayImage, RgbImage};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pipeline stage whose output can be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resized,
    Gray,
    Contrast,
    Denoised,
    Binary,
    Edges,
    Annotated,
}

impl Stage {
    /// Every stage in pipeline order.
    pub const ALL: [Stage; 7] = [
        Stage::Resized,
        Stage::Gray,
        Stage::Contrast,
        Stage::Denoised,
        Stage::Binary,
        Stage::Edges,
        Stage::Annotated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Resized => "resized",
            Stage::Gray => "gray",
            Stage::Contrast => "contrast",
            Stage::Denoised => "denoised",
            Stage::Binary => "binary",
            Stage::Edges => "edges",
            Stage::Annotated => "annotated",
        }
    }

    /// File name the stage is persisted under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Stage::Resized => "stage_resized.jpg",
            Stage::Gray => "stage_gray.jpg",
            Stage::Contrast => "stage_contrast.jpg",
            Stage::Denoised => "stage_denoised.jpg",
            Stage::Binary => "stage_binary.jpg",
            Stage::Edges => "stage_edges.jpg",
            Stage::Annotated => "car_with_detected_wheels.jpg",
        }
    }

    pub fn is_intermediate(&self) -> bool {
        !matches!(self, Stage::Annotated)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of a stage output.
#[derive(Debug, Clone, Copy)]
pub enum StageImage<'a> {
    Color(&'a RgbImage),
    Gray(&'a GrayImage),
}

impl StageImage<'_> {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            StageImage::Color(img) => img.dimensions(),
            StageImage::Gray(img) => img.dimensions(),
        }
    }

    pub fn to_dynamic(self) -> DynamicImage {
        match self {
            StageImage::Color(img) => DynamicImage::ImageRgb8(img.clone()),
            StageImage::Gray(img) => DynamicImage::ImageLuma8(img.clone()),
        }
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn record(&mut self, _stage: Stage, _image: StageImage<'_>) -> Result<()> {
        Ok(())
    }
}

/// Keeps owned copies of every snapshot in the order received.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    images: Vec<(Stage, DynamicImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stage: Stage) -> Option<&DynamicImage> {
        self.images
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, img)| img)
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.images.iter().map(|(s, _)| *s).collect()
    }
}

impl SnapshotSink for MemorySink {
    fn record(&mut self, stage: Stage, image: StageImage<'_>) -> Result<()> {
        self.images.push((stage, image.to_dynamic()));
        Ok(())
    }
}

/// Writes each snapshot to `<dir>/<stage file name>`.
///
/// The directory is created on the first write, so a run that fails before
/// any stage leaves the file system untouched.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stage: Stage) -> PathBuf {
        self.dir.join(stage.file_name())
    }
}

impl SnapshotSink for DirectorySink {
    fn record(&mut self, stage: Stage, image: StageImage<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(stage);

        let saved = match image {
            StageImage::Color(img) => img.save(&path),
            StageImage::Gray(img) => img.save(&path),
        };
        saved.map_err(|source| DetectionError::Save {
            stage: stage.name(),
            path: path.clone(),
            source,
        })?;

        debug!(
            stage = stage.name(),
            size = ?image.dimensions(),
            path = %path.display(),
            "snapshot written"
        );
        Ok(())
    }
}
