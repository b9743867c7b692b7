//! perceptd - perception loop daemon
//!
//! This daemon:
//! 1. Resolves the camera device's address (and re-resolves on drift)
//! 2. Pulls frames and proximity readings from the device
//! 3. Runs the configured detector variant over each frame
//! 4. Cleans raw detections (dedup, re-scoring, temporal smoothing)
//! 5. Fuses detections with the proximity reading
//! 6. Reports the fused result back to the device

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use percept::detect::{
    default_stage_labels, stage_tuning, Detector, EnsembleDetector, EnsembleStage, NeuralDetector,
    PeopleDetector, RegionClassifier, StubClassifier, StubModel,
};
use percept::{PerceptdConfig, PerceptionSession, SessionCommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Perception loop companion for ESP32-CAM devices")]
struct Args {
    /// Path to a JSON config file (defaults to PERCEPT_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the device address (host[:port]).
    #[arg(long, env = "PERCEPT_DEVICE_ADDR")]
    address: Option<String>,

    /// Override the active detector variant.
    #[arg(long, env = "PERCEPT_DETECTOR")]
    detector: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => PerceptdConfig::load_path(path)?,
        None => PerceptdConfig::load()?,
    };
    if let Some(address) = args.address {
        percept::device::validate_device_address(&address)?;
        cfg.device.address = address;
    }
    if let Some(detector) = args.detector {
        cfg.detector.variant = detector;
    }

    let detectors = build_detectors(&cfg);

    let stop = Arc::new(AtomicBool::new(false));
    let (commands, command_rx) = mpsc::channel();
    {
        let stop = stop.clone();
        let commands = commands.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
            let _ = commands.send(SessionCommand::Shutdown);
        })
        .context("install Ctrl-C handler")?;
    }

    let mut session = PerceptionSession::new(&cfg, detectors, command_rx, stop)?;
    log::info!(
        "perceptd {} watching device at {}",
        env!("CARGO_PKG_VERSION"),
        session.device_address()
    );
    session.run();

    let snap = session.stats_snapshot();
    log::info!(
        "final stats: frames={} objects={} per_class={:?}",
        snap.frames,
        snap.objects,
        snap.per_class
    );
    Ok(())
}

/// Wire the closed set of detector variants.
///
/// Models and cascade files are provisioned outside this crate; until a
/// real collaborator is linked in, the stub implementations keep the loop
/// (and the device round-trip) fully operational with empty detections.
fn build_detectors(cfg: &PerceptdConfig) -> Vec<Box<dyn Detector>> {
    let neural = NeuralDetector::new(Box::new(StubModel::new()))
        .with_confidence_threshold(cfg.detector.confidence_threshold);

    let stages = default_stage_labels()
        .iter()
        .map(|&label| {
            EnsembleStage::new(
                label,
                stage_tuning(label),
                Box::new(StubClassifier) as Box<dyn RegionClassifier>,
            )
        })
        .collect();
    let ensemble = EnsembleDetector::new(stages);

    let people = PeopleDetector::new(Box::new(StubClassifier), Box::new(StubClassifier));

    vec![Box::new(neural), Box::new(ensemble), Box::new(people)]
}
