use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Deserialize;

use equirect_blur_core::blurring::domain::face_obscurer::ObscureMode;
use equirect_blur_core::blurring::infrastructure::obscurer_factory::create_obscurer;
use equirect_blur_core::detection::domain::detector_config::DetectorConfig;
use equirect_blur_core::detection::domain::face_detector::FaceDetector;
use equirect_blur_core::detection::infrastructure::model_resolver::{self, ModelPaths};
use equirect_blur_core::detection::infrastructure::pcn_detector::{PcnDetector, PcnNetworks};
use equirect_blur_core::media::infrastructure::image_directory::pending_jobs;
use equirect_blur_core::media::infrastructure::image_file_reader::ImageFileReader;
use equirect_blur_core::media::infrastructure::image_file_writer::ImageFileWriter;
use equirect_blur_core::pipeline::blur_images_use_case::{BlurImagesUseCase, ProcessorFactory};
use equirect_blur_core::pipeline::frame_processor::FrameProcessor;
use equirect_blur_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use equirect_blur_core::projection::domain::tile_layout::TileLayout;
use equirect_blur_core::projection::infrastructure::tile_projection::DetectMode;
use equirect_blur_core::shared::constants::MAX_INPUT_FILES;

/// Blur faces in a directory of equirectangular 360° JPEG images.
#[derive(Parser)]
#[command(name = "equirect-blur")]
struct Cli {
    /// Directory of .jpg images.
    input_dir: PathBuf,

    /// Where the .png results go (defaults to the input directory).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory holding the PCN-*.onnx models.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Detection threshold applied to all three cascade stages.
    #[arg(long)]
    threshold: Option<f32>,

    /// Paint faces over with flat grey instead of blurring them.
    #[arg(long)]
    draw_over: bool,

    /// Treat the images as a sequence and track faces between them.
    #[arg(long)]
    track: bool,

    /// JSON file with "detector" and "layout" settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many images.
    #[arg(long, default_value_t = MAX_INPUT_FILES)]
    max_files: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunConfig {
    detector: DetectorConfig,
    layout: TileLayout,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = load_config(cli.config.as_deref())?;
    let mut detector_config = config.detector;
    if let Some(threshold) = cli.threshold {
        detector_config = detector_config.with_threshold(threshold);
    }
    detector_config.validate()?;
    config.layout.validate()?;

    let output_dir = cli.output_dir.clone().unwrap_or_else(|| cli.input_dir.clone());
    let jobs = pending_jobs(&cli.input_dir, &output_dir, cli.max_files)?;
    if jobs.is_empty() {
        log::info!("Nothing to do in {}", cli.input_dir.display());
        return Ok(());
    }
    log::info!("{} images to process", jobs.len());

    let models = model_resolver::resolve(cli.models_dir.as_deref())?;
    let mode = obscure_mode(cli.draw_over);
    let detect_mode = if cli.track {
        DetectMode::Track
    } else {
        DetectMode::Detect
    };

    let use_case = BlurImagesUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        processor_factory(models, detector_config, config.layout, mode),
        detect_mode,
    );
    let mut logger = StdoutPipelineLogger::new(1);
    let written = use_case.execute(&jobs, &mut logger)?;
    log::info!("Wrote {written} images to {}", output_dir.display());
    Ok(())
}

fn processor_factory(
    models: ModelPaths,
    detector_config: DetectorConfig,
    layout: TileLayout,
    mode: ObscureMode,
) -> ProcessorFactory {
    Box::new(move |width, height| {
        FrameProcessor::new(width, height, &layout, create_obscurer(mode), || {
            let networks = PcnNetworks::load(&models, 1)?;
            Ok(Box::new(PcnDetector::new(networks, detector_config.clone())?) as Box<dyn FaceDetector>)
        })
    })
}

fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
    let config = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input_dir.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input_dir.display()).into());
    }
    if let Some(threshold) = cli.threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(format!("Threshold must be a non-negative number, got {threshold}").into());
        }
    }
    if cli.max_files == 0 {
        return Err("--max-files must be at least 1".into());
    }
    Ok(())
}

fn obscure_mode(draw_over: bool) -> ObscureMode {
    if draw_over {
        ObscureMode::DrawOver
    } else {
        ObscureMode::Blur
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("equirect-blur").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["photos"]);
        assert_eq!(cli.input_dir, PathBuf::from("photos"));
        assert!(cli.output_dir.is_none());
        assert!(cli.threshold.is_none());
        assert!(!cli.draw_over && !cli.track);
        assert_eq!(cli.max_files, MAX_INPUT_FILES);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["in", "-o", "out", "--threshold", "0.8", "--draw-over", "--track", "--max-files", "5"]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.threshold, Some(0.8));
        assert_eq!(obscure_mode(cli.draw_over), ObscureMode::DrawOver);
        assert!(cli.track);
        assert_eq!(cli.max_files, 5);
    }

    #[test]
    fn test_missing_input_dir_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let cli = parse(&[missing.to_str().unwrap()]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_negative_threshold_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[dir.path().to_str().unwrap(), "--threshold=-1"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"detector": {"min_face_size": 40, "smooth": true}}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.detector.min_face_size, 40);
        assert!(config.detector.smooth);
        assert_eq!(config.detector.thresholds, DetectorConfig::default().thresholds);
        assert_eq!(config.layout, TileLayout::default());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_no_config_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.detector, DetectorConfig::default());
    }
}
