//! Console summary of a detection run

use wheelscan_cv::DetectionResult;

pub fn print_summary(result: &DetectionResult) {
    let stats = &result.stats;
    println!("Detection completed:");
    println!("  - Frame: {}x{}", stats.frame_width, stats.frame_height);
    println!(
        "  - Contours: {} found, {} large enough, {} in lower half",
        stats.selection.contours, stats.selection.above_min_area, stats.selection.in_lower_region
    );
    for (i, wheel) in result.wheels.iter().enumerate() {
        let (major, minor) = wheel.ellipse.axes();
        println!(
            "  - Wheel {}: center ({}, {}), axes {:.1} x {:.1}, angle {:.1} deg",
            i + 1,
            wheel.center.x,
            wheel.center.y,
            major,
            minor,
            wheel.ellipse.angle_degrees()
        );
    }
    if result.wheels.is_empty() {
        println!("  - No wheels found");
    }
    println!("  - Time: {}ms", stats.processing_time_ms);
}
