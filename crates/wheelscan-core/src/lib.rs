//! Wheelscan core types
//!
//! Pure geometry shared by the detection pipeline: boundary contours,
//! their polygon moments, and least-squares ellipse fits.

pub mod geometry;

pub use geometry::{Candidate, Contour, Ellipse, Moments, Point};
