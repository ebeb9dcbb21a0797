//! Contour selection and ellipse fitting
//!
//! Outer boundaries of the edge map flow through independent policies:
//! minimum area, computable centroid, lower-region centroid, then a stable
//! descending sort by area truncated to the wheel count. Survivors with
//! enough points get an ellipse.

use super::config::SelectionConfig;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use serde::Serialize;
use tracing::debug;
use wheelscan_core::{Candidate, Contour, Ellipse, Moments, Point};

/// A fitted wheel and the candidate it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WheelEllipse {
    pub ellipse: Ellipse,
    /// Ellipse center truncated to pixel coordinates, where the marker goes.
    pub center: Point,
    pub area: f64,
    pub contour_points: usize,
}

impl WheelEllipse {
    fn new(ellipse: Ellipse, candidate: &Candidate) -> Self {
        let (cx, cy) = ellipse.center();
        Self {
            ellipse,
            center: Point::new(cx as i32, cy as i32),
            area: candidate.area,
            contour_points: candidate.contour.len(),
        }
    }
}

/// How many contours were left after each policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub contours: usize,
    pub above_min_area: usize,
    pub with_centroid: usize,
    pub in_lower_region: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub candidates: Vec<Candidate>,
    pub stats: SelectionStats,
}

/// Region selector over one frame's contours
pub struct RegionSelector {
    config: SelectionConfig,
}

impl RegionSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Outermost boundaries of the non-zero regions of `edges`.
    ///
    /// Holes and anything nested inside another boundary are dropped.
    pub fn extract_contours(edges: &GrayImage) -> Vec<Contour> {
        find_contours::<i32>(edges)
            .into_iter()
            .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
            .map(|c| {
                let points: Vec<Point> = c.points.iter().map(|p| Point::new(p.x, p.y)).collect();
                Contour::from_border(&points)
            })
            .collect()
    }

    /// Area a contour must strictly exceed.
    pub fn min_area(&self, width: u32, height: u32) -> f64 {
        self.config.min_area_fraction * width as f64 * height as f64
    }

    /// Row a centroid must lie strictly below.
    pub fn midline(&self, height: u32) -> f64 {
        height as f64 * self.config.midline_fraction
    }

    pub fn passes_min_area(&self, area: f64, width: u32, height: u32) -> bool {
        area > self.min_area(width, height)
    }

    pub fn in_lower_region(&self, centroid: Point, height: u32) -> bool {
        centroid.y as f64 > self.midline(height)
    }

    /// Filter and rank `contours` of a `width`×`height` frame.
    pub fn select(&self, contours: Vec<Contour>, width: u32, height: u32) -> Selection {
        let mut stats = SelectionStats {
            contours: contours.len(),
            ..Default::default()
        };

        let sized: Vec<(Moments, Contour)> = measure(contours)
            .into_iter()
            .filter(|(m, _)| self.passes_min_area(m.m00.abs(), width, height))
            .collect();
        stats.above_min_area = sized.len();

        let centred: Vec<Candidate> = sized
            .into_iter()
            .filter_map(|(m, contour)| {
                m.centroid().map(|centroid| Candidate {
                    area: m.m00.abs(),
                    centroid,
                    contour,
                })
            })
            .collect();
        stats.with_centroid = centred.len();

        let mut candidates: Vec<Candidate> = centred
            .into_iter()
            .filter(|c| self.in_lower_region(c.centroid, height))
            .collect();
        stats.in_lower_region = candidates.len();

        rank(&mut candidates);
        candidates.truncate(self.config.max_wheels);
        stats.selected = candidates.len();

        debug!(
            contours = stats.contours,
            above_min_area = stats.above_min_area,
            with_centroid = stats.with_centroid,
            in_lower_region = stats.in_lower_region,
            selected = stats.selected,
            "region selection"
        );

        Selection { candidates, stats }
    }

    /// Fit ellipses to the candidates, in order.
    ///
    /// Candidates with fewer than `min_fit_points` points are skipped without
    /// error. Every other candidate gets an ellipse, whatever its shape.
    pub fn fit(&self, candidates: &[Candidate]) -> Vec<WheelEllipse> {
        candidates
            .iter()
            .filter(|c| c.contour.len() >= self.config.min_fit_points)
            .filter_map(|c| Ellipse::fit(c.contour.points()).map(|e| WheelEllipse::new(e, c)))
            .collect()
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

/// Sort by area, largest first; equal areas keep extraction order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
}

/// Moments of every contour, in input order.
fn measure(contours: Vec<Contour>) -> Vec<(Moments, Contour)> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        contours
            .into_par_iter()
            .map(|c| (c.moments(), c))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        contours.into_iter().map(|c| (c.moments(), c)).collect()
    }
}
