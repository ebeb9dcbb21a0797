//! Ellipse and center annotations

use crate::detection::config::AnnotationConfig;
use crate::detection::WheelEllipse;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use wheelscan_core::Ellipse;

/// Copy `base` and draw every wheel outline and center marker on it.
pub fn annotate(base: &RgbImage, wheels: &[WheelEllipse], style: &AnnotationConfig) -> RgbImage {
    let mut canvas = base.clone();
    for wheel in wheels {
        draw_thick_ellipse(
            &mut canvas,
            &wheel.ellipse,
            style.ellipse_thickness,
            Rgb(style.ellipse_color),
        );
        let radius = style.center_radius + style.center_thickness / 2;
        draw_filled_circle_mut(
            &mut canvas,
            (wheel.center.x, wheel.center.y),
            radius as i32,
            Rgb(style.center_color),
        );
    }
    canvas
}

/// Stroke an ellipse outline by stamping discs along it at sub-pixel spacing.
pub fn draw_thick_ellipse(
    canvas: &mut RgbImage,
    ellipse: &Ellipse,
    thickness: u32,
    color: Rgb<u8>,
) {
    let samples = (ellipse.perimeter() * 2.0).ceil().max(16.0) as usize;
    let radius = (thickness / 2) as i32;

    for (x, y) in ellipse.sample_points(samples) {
        let center = (x.round() as i32, y.round() as i32);
        if radius == 0 {
            if let (Ok(px), Ok(py)) = (u32::try_from(center.0), u32::try_from(center.1)) {
                if px < canvas.width() && py < canvas.height() {
                    canvas.put_pixel(px, py, color);
                }
            }
        } else {
            draw_filled_circle_mut(canvas, center, radius, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelscan_core::Point;

    fn wheel(cx: f64, cy: f64, a: f64, b: f64) -> WheelEllipse {
        WheelEllipse {
            ellipse: Ellipse {
                cx,
                cy,
                semi_major: a,
                semi_minor: b,
                angle: 0.0,
            },
            center: Point::new(cx as i32, cy as i32),
            area: std::f64::consts::PI * a * b,
            contour_points: 32,
        }
    }

    #[test]
    fn test_no_wheels_leaves_image_unchanged() {
        let base = RgbImage::from_pixel(50, 40, Rgb([200, 200, 200]));
        let out = annotate(&base, &[], &AnnotationConfig::default());
        assert_eq!(out, base);
    }

    #[test]
    fn test_outline_and_center_colors() {
        let base = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let style = AnnotationConfig::default();
        let out = annotate(&base, &[wheel(50.0, 50.0, 30.0, 20.0)], &style);

        assert_eq!(out.get_pixel(50, 50), &Rgb(style.center_color));
        assert_eq!(out.get_pixel(80, 50), &Rgb(style.ellipse_color));
        assert_eq!(out.get_pixel(50, 30), &Rgb(style.ellipse_color));
        // Interior between outline and marker stays untouched.
        assert_eq!(out.get_pixel(65, 50), &Rgb([0, 0, 0]));
        assert_eq!(base.get_pixel(80, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_ellipse_partly_off_canvas() {
        let mut canvas = RgbImage::new(20, 20);
        let ellipse = Ellipse {
            cx: 0.0,
            cy: 0.0,
            semi_major: 15.0,
            semi_minor: 10.0,
            angle: 0.3,
        };
        draw_thick_ellipse(&mut canvas, &ellipse, 1, Rgb([1, 2, 3]));
        assert!(canvas.pixels().any(|p| *p == Rgb([1, 2, 3])));
    }
}
