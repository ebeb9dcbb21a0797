//! Closed outer boundaries and their polygon measurements

use super::Point;
use serde::{Deserialize, Serialize};

/// Spatial moments of a closed polygon up to first order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Moments {
    /// Signed area; the sign follows the traversal direction.
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Centroid truncated toward zero, `None` for a zero-area polygon.
    pub fn centroid(&self) -> Option<Point> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point::new(
            (self.m10 / self.m00) as i32,
            (self.m01 / self.m00) as i32,
        ))
    }
}

/// Ordered closed sequence of boundary points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    /// Wrap points that are already in their final (compressed) form.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build from a raw 8-connected border trace, keeping only the end
    /// points of straight runs.
    pub fn from_border(points: &[Point]) -> Self {
        Self::new(compress_chain(points))
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polygon moments via Green's theorem over the point sequence.
    pub fn moments(&self) -> Moments {
        let n = self.points.len();
        if n < 3 {
            return Moments::default();
        }

        let (mut a, mut ax, mut ay) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let (x0, y0, x1, y1) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
            let cross = x0 * y1 - x1 * y0;
            a += cross;
            ax += (x0 + x1) * cross;
            ay += (y0 + y1) * cross;
        }

        Moments {
            m00: a / 2.0,
            m10: ax / 6.0,
            m01: ay / 6.0,
        }
    }

    /// Unsigned shoelace area
    pub fn area(&self) -> f64 {
        self.moments().m00.abs()
    }

    pub fn centroid(&self) -> Option<Point> {
        self.moments().centroid()
    }
}

/// Drop every point that continues a horizontal, vertical or diagonal run
/// in the same direction as the step into it.
///
/// The input is treated as closed, so the wrap-around step counts too.
pub fn compress_chain(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point, b: Point| ((b.x - a.x).signum(), (b.y - a.y).signum());

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_trace(x0: i32, y0: i32, side: i32) -> Vec<Point> {
        let mut pts = Vec::new();
        for x in x0..x0 + side {
            pts.push(Point::new(x, y0));
        }
        for y in y0..y0 + side {
            pts.push(Point::new(x0 + side, y));
        }
        for x in (x0 + 1..=x0 + side).rev() {
            pts.push(Point::new(x, y0 + side));
        }
        for y in (y0 + 1..=y0 + side).rev() {
            pts.push(Point::new(x0, y));
        }
        pts
    }

    #[test]
    fn test_compress_square_to_corners() {
        let contour = Contour::from_border(&square_trace(2, 3, 10));
        assert_eq!(
            contour.points(),
            &[
                Point::new(2, 3),
                Point::new(12, 3),
                Point::new(12, 13),
                Point::new(2, 13)
            ]
        );
    }

    #[test]
    fn test_compress_keeps_short_chains() {
        let pts = vec![Point::new(0, 0), Point::new(1, 0)];
        assert_eq!(compress_chain(&pts), pts);
    }

    #[test]
    fn test_area_and_centroid() {
        let contour = Contour::from_border(&square_trace(10, 20, 10));
        assert_eq!(contour.area(), 100.0);
        assert_eq!(contour.centroid(), Some(Point::new(15, 25)));
    }

    #[test]
    fn test_area_independent_of_orientation() {
        let mut pts = square_trace(0, 0, 6);
        let forward = Contour::from_border(&pts);
        pts.reverse();
        let backward = Contour::from_border(&pts);

        assert_eq!(forward.area(), backward.area());
        assert_eq!(forward.moments().m00, -backward.moments().m00);
        assert_eq!(forward.centroid(), backward.centroid());
    }

    #[test]
    fn test_degenerate_contour_has_no_centroid() {
        let line = Contour::new(vec![Point::new(0, 0), Point::new(5, 0), Point::new(9, 0)]);
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.centroid(), None);
        assert_eq!(Contour::new(vec![Point::new(4, 4)]).centroid(), None);
    }
}
