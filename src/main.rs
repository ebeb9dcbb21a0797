use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use wheelscan_cv::{DetectionConfig, DetectionResult, DirectorySink, Stage, WheelDetector};

mod report;

/// Photograph the detector reads, relative to the working directory.
const INPUT_IMAGE: &str = "car.jpg";

fn run(sink: &mut DirectorySink) -> anyhow::Result<DetectionResult> {
    let detector = WheelDetector::new(DetectionConfig::default())?;
    detector.detect_from_file(INPUT_IMAGE, sink)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut sink = DirectorySink::new(&DetectionConfig::default().output_dir);

    match run(&mut sink) {
        Ok(result) => {
            report::print_summary(&result);
            println!(
                "Wheels highlighted and saved as '{}'",
                sink.path_for(Stage::Annotated).display()
            );
            println!("Intermediate stages saved as stage_*.jpg in '{}'", sink.dir().display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Detection failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
