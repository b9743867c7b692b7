//! The perception session and its cycle loop.
//!
//! One cycle runs to completion before the next begins: drain commands,
//! housekeeping, fetch frame and sensor reading, infer, post-process,
//! fuse, report, record stats. Every network call is individually
//! bounded, so a vanished device slows the loop down to its timeouts but
//! never stalls it. All mutable state (endpoint, histories, counters) is
//! owned here and touched only between cycles.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PerceptdConfig;
use crate::detect::Detector;
use crate::device::{DeviceLocator, Endpoint, FrameSource, ResultReporter, SensorReader};
use crate::fuse::fuse;
use crate::post::PostProcessor;
use crate::stats::StatsAggregator;

/// Commands pushed in by external input sources (signal handlers, future
/// control surfaces). Drained once per cycle; nothing mutates session
/// state mid-cycle.
#[derive(Clone, Debug)]
pub enum SessionCommand {
    /// Switch the active detector variant by name.
    SetDetector(String),
    /// Adjust the active detector's confidence threshold.
    SetConfidenceThreshold(f32),
    /// Zero the stats counters and forget detection history.
    ResetStats,
    Shutdown,
}

/// What one cycle did, for callers that step the loop manually.
#[derive(Clone, Copy, Debug)]
pub struct CycleOutcome {
    pub frame_ok: bool,
    pub reported: bool,
    pub objects: usize,
}

/// The resilient perception loop.
pub struct PerceptionSession {
    endpoint: Endpoint,
    locator: DeviceLocator,
    frames: FrameSource,
    sensor: SensorReader,
    reporter: ResultReporter,
    detectors: Vec<Box<dyn Detector>>,
    active_detector: usize,
    post: PostProcessor,
    stats: StatsAggregator,
    rediscovery_interval: std::time::Duration,
    failure_streak: u32,
    stats_interval: std::time::Duration,
    idle_backoff: std::time::Duration,
    commands: Receiver<SessionCommand>,
    stop: Arc<AtomicBool>,
    last_resolve: Instant,
    last_stats_log: Instant,
}

impl PerceptionSession {
    /// Build a session and resolve the initial endpoint.
    ///
    /// Discovery runs once here so a device that already moved off its
    /// configured address is found before the first cycle.
    pub fn new(
        cfg: &PerceptdConfig,
        detectors: Vec<Box<dyn Detector>>,
        commands: Receiver<SessionCommand>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        if detectors.is_empty() {
            return Err(anyhow!("at least one detector variant is required"));
        }
        let active_detector = detectors
            .iter()
            .position(|d| d.name() == cfg.detector.variant)
            .ok_or_else(|| {
                anyhow!(
                    "configured detector variant '{}' is not available",
                    cfg.detector.variant
                )
            })?;

        let paths = cfg.device.capability_paths();
        let locator = DeviceLocator::new(paths, cfg.device.discovery_timeout);
        let endpoint = locator.resolve(&cfg.device.address);
        log::info!(
            "session bound to device at {} (detector: {})",
            endpoint.address,
            cfg.detector.variant
        );

        Ok(Self {
            endpoint,
            locator,
            frames: FrameSource::new(cfg.device.frame_timeout, cfg.device.max_frame_width),
            sensor: SensorReader::new(cfg.device.sensor_timeout),
            reporter: ResultReporter::new(cfg.device.report_timeout),
            detectors,
            active_detector,
            post: PostProcessor::new(
                cfg.post.confidence_threshold,
                cfg.post.smoothing_window,
            ),
            stats: StatsAggregator::new(),
            rediscovery_interval: cfg.loop_control.rediscovery_interval,
            failure_streak: cfg.loop_control.failure_streak,
            stats_interval: cfg.loop_control.stats_interval,
            idle_backoff: cfg.loop_control.idle_backoff,
            commands,
            stop,
            last_resolve: Instant::now(),
            last_stats_log: Instant::now(),
        })
    }

    /// Run cycles until the stop flag is raised.
    pub fn run(&mut self) {
        log::info!("perception loop running");
        while !self.stop.load(Ordering::Relaxed) {
            let outcome = self.run_cycle();
            if !outcome.frame_ok {
                // No frame this cycle; back off briefly instead of
                // hammering an unreachable device.
                std::thread::sleep(self.idle_backoff);
            }
        }
        log::info!("perception loop stopped");
    }

    /// Execute exactly one cycle.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.drain_commands();

        if self.last_resolve.elapsed() >= self.rediscovery_interval {
            self.resolve_endpoint("interval");
        }

        let frame = self.frames.fetch(&self.endpoint);
        let reading = self.sensor.read(&self.endpoint);

        let objects = match &frame {
            Some(frame) => {
                let detector = &mut self.detectors[self.active_detector];
                let raw = match detector.infer(frame) {
                    Ok(raw) => raw,
                    Err(e) => {
                        // Inference failure skips this cycle's detections
                        // only; the cycle still completes and reports.
                        log::warn!("{} inference failed: {}", detector.name(), e);
                        Vec::new()
                    }
                };
                self.post.process(raw, frame.width, frame.height)
            }
            None => {
                log::debug!("no frame from {}", self.endpoint.address);
                Vec::new()
            }
        };

        let fused = fuse(&reading, objects);
        let reported = self.reporter.report(&mut self.endpoint, &fused);
        if !reported && self.endpoint.consecutive_failures >= self.failure_streak {
            // Streak threshold reached: re-resolve once before the next
            // report attempt. The replacement endpoint starts a new streak.
            self.resolve_endpoint("failure streak");
        }

        self.stats.record(&fused.objects);
        if self.last_stats_log.elapsed() >= self.stats_interval {
            let snap = self.stats.snapshot();
            log::info!(
                "stats: frames={} objects={} per_class={:?}",
                snap.frames,
                snap.objects,
                snap.per_class
            );
            self.last_stats_log = Instant::now();
        }

        CycleOutcome {
            frame_ok: frame.is_some(),
            reported,
            objects: fused.objects.len(),
        }
    }

    pub fn stats_snapshot(&self) -> crate::stats::StatsSnapshot {
        self.stats.snapshot()
    }

    /// Address of the currently bound endpoint.
    pub fn device_address(&self) -> &str {
        &self.endpoint.address
    }

    fn resolve_endpoint(&mut self, reason: &str) {
        log::debug!("re-resolving device address ({})", reason);
        // Wholesale replacement: cycles never see a half-updated endpoint.
        self.endpoint = self.locator.resolve(&self.endpoint.address);
        self.last_resolve = Instant::now();
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                SessionCommand::SetDetector(name) => {
                    match self.detectors.iter().position(|d| d.name() == name) {
                        Some(index) => {
                            self.active_detector = index;
                            log::info!("active detector switched to '{}'", name);
                        }
                        None => log::warn!("unknown detector variant '{}'", name),
                    }
                }
                SessionCommand::SetConfidenceThreshold(threshold) => {
                    if (0.0..=1.0).contains(&threshold) {
                        self.detectors[self.active_detector].set_confidence_threshold(threshold);
                        log::info!("confidence threshold set to {:.2}", threshold);
                    } else {
                        log::warn!("ignoring out-of-range confidence threshold {}", threshold);
                    }
                }
                SessionCommand::ResetStats => {
                    self.stats.reset();
                    self.post.reset();
                    log::info!("stats and detection history reset");
                }
                SessionCommand::Shutdown => {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
        }
    }
}
