//! Least-squares ellipse fitting.
//!
//! Points are shifted to their centroid and scaled to unit mean radius,
//! then fitted with the direct least-squares method of Fitzgibbon et al.:
//! the conic `A x² + B xy + C y² + D x + E y + F = 0` minimizing the
//! algebraic error subject to `4AC − B² = 1`. The constraint makes every
//! non-degenerate point set, concave outlines included, yield an ellipse.

use super::Point;
use nalgebra::{Matrix2, Matrix3, Matrix6, SymmetricEigen, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Fewest points that determine a conic.
pub const MIN_FIT_POINTS: usize = 5;

/// Rotated ellipse in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    /// Semi-major axis length.
    pub semi_major: f64,
    /// Semi-minor axis length.
    pub semi_minor: f64,
    /// Major axis direction from +x in radians, in (−π/2, π/2].
    pub angle: f64,
}

impl Ellipse {
    /// Fit an ellipse to boundary points.
    ///
    /// Returns `None` only with fewer than [`MIN_FIT_POINTS`] points or when
    /// the points are coincident or collinear.
    pub fn fit(points: &[Point]) -> Option<Self> {
        if points.len() < MIN_FIT_POINTS {
            return None;
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
        let mean_dist = points
            .iter()
            .map(|p| (p.x as f64 - mean_x).hypot(p.y as f64 - mean_y))
            .sum::<f64>()
            / n;
        if mean_dist <= f64::EPSILON {
            return None;
        }
        let scale = 1.0 / mean_dist;
        let normalized: Vec<(f64, f64)> = points
            .iter()
            .map(|p| ((p.x as f64 - mean_x) * scale, (p.y as f64 - mean_y) * scale))
            .collect();

        let mut scatter = Matrix6::<f64>::zeros();
        for &(x, y) in &normalized {
            let row = Vector6::new(x * x, x * y, y * y, x, y, 1.0);
            scatter += row * row.transpose();
        }

        // Centered, the linear block is `n` times the point covariance padded
        // with `n`, so its determinant vanishes for collinear points.
        let s22 = scatter.fixed_view::<3, 3>(3, 3).into_owned();
        if s22.determinant() <= 1e-10 * n.powi(3) {
            return None;
        }
        let s22_inv = s22.try_inverse()?;

        let unit = direct_fit(&scatter, &s22_inv)
            .and_then(conic_to_ellipse)
            .filter(Ellipse::is_valid)
            .or_else(|| covariance_ellipse(&normalized))?;

        let fitted = Self {
            cx: unit.cx / scale + mean_x,
            cy: unit.cy / scale + mean_y,
            semi_major: unit.semi_major / scale,
            semi_minor: unit.semi_minor / scale,
            angle: unit.angle,
        };
        fitted.is_valid().then_some(fitted)
    }

    pub fn is_valid(&self) -> bool {
        self.semi_major > 0.0
            && self.semi_minor > 0.0
            && self.semi_major.is_finite()
            && self.semi_minor.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle.is_finite()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.cx, self.cy)
    }

    /// Full axis lengths `(major, minor)`.
    pub fn axes(&self) -> (f64, f64) {
        (2.0 * self.semi_major, 2.0 * self.semi_minor)
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Ramanujan's perimeter approximation.
    pub fn perimeter(&self) -> f64 {
        let (a, b) = (self.semi_major, self.semi_minor);
        let h = ((a - b) / (a + b)).powi(2);
        PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
    }

    /// `n` evenly spaced (in parameter) points on the boundary.
    pub fn sample_points(&self, n: usize) -> Vec<(f64, f64)> {
        let (sin_a, cos_a) = self.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                let px = self.semi_major * t.cos();
                let py = self.semi_minor * t.sin();
                (
                    self.cx + cos_a * px - sin_a * py,
                    self.cy + sin_a * px + cos_a * py,
                )
            })
            .collect()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let dx = x - self.cx;
        let dy = y - self.cy;
        let u = (cos_a * dx + sin_a * dy) / self.semi_major;
        let v = (-sin_a * dx + cos_a * dy) / self.semi_minor;
        u * u + v * v <= 1.0
    }
}

/// Conic coefficients from the ellipse-constrained eigensystem.
///
/// With the scatter matrix split into quadratic and linear blocks, the
/// quadratic part `a1` solves `(S11 − S12 S22⁻¹ S21) a1 = λ C1 a1`, and the
/// linear part follows as `a2 = −S22⁻¹ S21 a1`.
fn direct_fit(scatter: &Matrix6<f64>, s22_inv: &Matrix3<f64>) -> Option<[f64; 6]> {
    let s11 = scatter.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = scatter.fixed_view::<3, 3>(0, 3).into_owned();
    let reduced = s11 - s12 * s22_inv * s12.transpose();

    // Inverse of C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]].
    let c1_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let system = c1_inv * reduced;

    let a1 = constrained_eigenvector(&system)?;
    let a2 = -(s22_inv * s12.transpose() * a1);
    Some([a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]])
}

/// Eigenvector of `system` that satisfies `4AC − B² > 0`.
///
/// Eigenvalues come from the characteristic cubic, eigenvectors from the
/// adjugate of `system − λI`.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let trace = a.trace();
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in cubic_roots(-trace, minor_sum, -a.determinant()) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * ev)) else {
            continue;
        };
        let admissible = 4.0 * v[0] * v[2] - v[1] * v[1] > 0.0;
        if admissible && best.is_none_or(|(b, _)| ev.abs() < b) {
            best = Some((ev.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Real roots of `x³ + b x² + c x + d`.
fn cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    if -4.0 * p * p * p - 27.0 * q * q >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((theta + 2.0 * PI * k as f64) / 3.0).cos() + shift)
            .collect()
    } else {
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + sqrt_disc).cbrt() + (-q / 2.0 - sqrt_disc).cbrt() + shift]
    }
}

/// Unit null vector of a rank-2 matrix: its largest adjugate row.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];
    let best = rows
        .into_iter()
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;
    let norm = best.norm();
    (norm > 1e-15).then(|| best / norm)
}

/// Ellipse with the second moments of the points.
///
/// Points spread evenly along an ellipse boundary have variance `a²/2`
/// along each axis, hence the `√(2λ)` semi-axes.
fn covariance_ellipse(points: &[(f64, f64)]) -> Option<Ellipse> {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let (mx, my) = (sx / n, sy / n);
    let (cxx, cyy, cxy) = points.iter().fold((0.0, 0.0, 0.0), |(xx, yy, xy), &(x, y)| {
        let (dx, dy) = (x - mx, y - my);
        (xx + dx * dx / n, yy + dy * dy / n, xy + dx * dy / n)
    });

    let trace = cxx + cyy;
    let disc = ((cxx - cyy).powi(2) + 4.0 * cxy * cxy).sqrt();
    let lambda_max = (trace + disc) / 2.0;
    let lambda_min = (trace - disc) / 2.0;
    if lambda_min <= 1e-12 {
        return None;
    }

    let ellipse = Ellipse {
        cx: mx,
        cy: my,
        semi_major: (2.0 * lambda_max).sqrt(),
        semi_minor: (2.0 * lambda_min).sqrt(),
        angle: normalize_angle(0.5 * (2.0 * cxy).atan2(cxx - cyy)),
    };
    Some(ellipse)
}

fn normalize_angle(mut angle: f64) -> f64 {
    while angle > FRAC_PI_2 {
        angle -= PI;
    }
    while angle <= -FRAC_PI_2 {
        angle += PI;
    }
    angle
}

/// Geometric parameters of `A x² + B xy + C y² + D x + E y + F = 0`.
fn conic_to_ellipse([a, b, c, d, e, f]: [f64; 6]) -> Option<Ellipse> {
    let denom = 4.0 * a * c - b * b;
    if denom <= 1e-12 {
        return None;
    }

    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;
    let f_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-12 {
        return None;
    }

    let quad = Matrix2::new(a, b / 2.0, b / 2.0, c);
    let eigen = SymmetricEigen::new(quad);
    let (l0, l1) = (eigen.eigenvalues[0], eigen.eigenvalues[1]);

    let sq0 = -f_center / l0;
    let sq1 = -f_center / l1;
    if sq0 <= 0.0 || sq1 <= 0.0 {
        return None;
    }

    // Larger semi-axis belongs to the smaller eigenvalue.
    let (semi_major, semi_minor, axis) = if sq0 >= sq1 {
        (sq0.sqrt(), sq1.sqrt(), eigen.eigenvectors.column(0))
    } else {
        (sq1.sqrt(), sq0.sqrt(), eigen.eigenvectors.column(1))
    };

    let angle = normalize_angle(axis[1].atan2(axis[0]));

    Some(Ellipse {
        cx,
        cy,
        semi_major,
        semi_minor,
        angle,
    })
}
