//! Geometric records produced by region selection

pub mod contour;
pub mod ellipse;

pub use contour::{compress_chain, Contour, Moments};
pub use ellipse::{Ellipse, MIN_FIT_POINTS};

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// A contour that survived the area and position filters.
///
/// Candidates are ranked by `area` only; the centroid is kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub area: f64,
    pub centroid: Point,
    pub contour: Contour,
}
