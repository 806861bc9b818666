//! Command-line front end for best still-frame extraction.

use anyhow::{bail, Context, Result};
use bestframe::config::Config;
use bestframe::crop::FaceCropper;
use bestframe::detector::LandmarkDetector;
use bestframe::face_location::OnnxFaceLocator;
use bestframe::mesh::MeshLandmarkDetector;
use bestframe::selector::best_frame;
use bestframe::sparse::{LandmarkRegressor, SparseLandmarkDetector};
use clap::Parser;
use log::info;
use opencv::core::Vector;
use opencv::imgcodecs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Best still-frame extraction from video", long_about = None)]
struct Args {
    /// Video file path or URL to scan
    #[arg(short, long)]
    video: String,

    /// Landmark strategy (mesh, sparse)
    #[arg(short, long, default_value = "mesh")]
    strategy: String,

    /// Output directory for the selected frame
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("invalid configuration")?;

    run(&args, &config)
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let mut detector = build_detector(&args.strategy, config)?;

    let locator = OnnxFaceLocator::with_thresholds(
        &config.models.face_detector,
        config.models.confidence_threshold,
        config.models.nms_threshold,
    )
    .context("failed to load the face detector model")?;
    let mut cropper = FaceCropper::with_padding(Box::new(locator), config.crop.padding);

    let selector = config.selector();
    let (base_name, frame) =
        best_frame(&args.video, detector.as_mut(), &mut cropper, &selector)?;

    let Some(frame) = frame else {
        if base_name.is_none() {
            bail!("failed to open video source: {}", args.video);
        }
        bail!("no suitable frame found in {}", args.video);
    };

    let stem = base_name.unwrap_or_else(|| "bestframe".to_string());
    let output_path = args.out.join(format!("{stem}.jpeg"));
    let output = output_path
        .to_str()
        .with_context(|| format!("non-UTF-8 output path: {}", output_path.display()))?;

    imgcodecs::imwrite(output, &frame, &Vector::new())
        .with_context(|| format!("failed to write {output}"))?;
    info!("Wrote best frame to {output}");

    Ok(())
}

fn build_detector(strategy: &str, config: &Config) -> Result<Box<dyn LandmarkDetector>> {
    match strategy {
        "mesh" => {
            config.validate_models(true, false)?;
            let detector =
                MeshLandmarkDetector::with_schema(&config.models.face_mesh, config.mesh_schema())
                    .context("failed to load the face mesh model")?;
            Ok(Box::new(detector))
        }
        "sparse" => {
            config.validate_models(false, true)?;
            let locator = OnnxFaceLocator::with_thresholds(
                &config.models.face_detector,
                config.models.confidence_threshold,
                config.models.nms_threshold,
            )
            .context("failed to load the face detector model")?;
            let regressor = LandmarkRegressor::new(&config.models.face_landmarks)
                .context("failed to load the face landmarks model")?;
            Ok(Box::new(SparseLandmarkDetector::from_parts(
                Box::new(locator),
                regressor,
                config.sparse_schema(),
            )))
        }
        other => bail!("unknown landmark strategy '{other}' (expected 'mesh' or 'sparse')"),
    }
}
