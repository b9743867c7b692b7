//! perceptd configuration.
//!
//! Layered the usual way: baked-in defaults, then an optional JSON config
//! file (`PERCEPT_CONFIG`), then environment overrides, then validation.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::device::{validate_device_address, CapabilityPaths};

const DEFAULT_DEVICE_ADDR: &str = "192.168.4.1";
const DEFAULT_SENSOR_PATH: &str = "/distance";
const DEFAULT_RESULT_PATH: &str = "/results";
const DEFAULT_DISCOVERY_PATH: &str = "/ip";
const DEFAULT_FRAME_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_SENSOR_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_REPORT_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_MAX_FRAME_WIDTH: u32 = 640;
const DEFAULT_DETECTOR: &str = "neural";
const DEFAULT_DETECTOR_CONFIDENCE: f32 = 0.5;
const DEFAULT_POST_CONFIDENCE: f32 = 0.6;
const DEFAULT_SMOOTHING_WINDOW: usize = 5;
const DEFAULT_REDISCOVERY_SECS: u64 = 10;
const DEFAULT_FAILURE_STREAK: u32 = 3;
const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;
const DEFAULT_IDLE_BACKOFF_MS: u64 = 100;

fn default_frame_paths() -> Vec<String> {
    CapabilityPaths::default().frame
}

#[derive(Debug, Deserialize, Default)]
struct PerceptdConfigFile {
    device: Option<DeviceConfigFile>,
    detector: Option<DetectorConfigFile>,
    post: Option<PostConfigFile>,
    #[serde(rename = "loop")]
    loop_control: Option<LoopConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DeviceConfigFile {
    address: Option<String>,
    frame_paths: Option<Vec<String>>,
    sensor_path: Option<String>,
    result_path: Option<String>,
    discovery_path: Option<String>,
    frame_timeout_ms: Option<u64>,
    sensor_timeout_ms: Option<u64>,
    report_timeout_ms: Option<u64>,
    discovery_timeout_ms: Option<u64>,
    max_frame_width: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    variant: Option<String>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct PostConfigFile {
    confidence_threshold: Option<f32>,
    smoothing_window: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct LoopConfigFile {
    rediscovery_interval_secs: Option<u64>,
    failure_streak: Option<u32>,
    stats_interval_secs: Option<u64>,
    idle_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PerceptdConfig {
    pub device: DeviceSettings,
    pub detector: DetectorSettings,
    pub post: PostSettings,
    pub loop_control: LoopControlSettings,
}

#[derive(Debug, Clone)]
pub struct DeviceSettings {
    /// `host[:port]` of the camera device.
    pub address: String,
    pub frame_paths: Vec<String>,
    pub sensor_path: String,
    pub result_path: String,
    pub discovery_path: String,
    pub frame_timeout: Duration,
    pub sensor_timeout: Duration,
    pub report_timeout: Duration,
    pub discovery_timeout: Duration,
    pub max_frame_width: u32,
}

impl DeviceSettings {
    pub fn capability_paths(&self) -> CapabilityPaths {
        CapabilityPaths {
            frame: self.frame_paths.clone(),
            sensor: self.sensor_path.clone(),
            result: self.result_path.clone(),
            discovery: self.discovery_path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Active detector variant: "neural", "ensemble" or "people".
    pub variant: String,
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct PostSettings {
    pub confidence_threshold: f32,
    pub smoothing_window: usize,
}

#[derive(Debug, Clone)]
pub struct LoopControlSettings {
    pub rediscovery_interval: Duration,
    pub failure_streak: u32,
    pub stats_interval: Duration,
    pub idle_backoff: Duration,
}

impl PerceptdConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PERCEPT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PerceptdConfigFile) -> Self {
        let device = file.device.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();
        let post = file.post.unwrap_or_default();
        let loop_control = file.loop_control.unwrap_or_default();
        Self {
            device: DeviceSettings {
                address: device
                    .address
                    .unwrap_or_else(|| DEFAULT_DEVICE_ADDR.to_string()),
                frame_paths: device.frame_paths.unwrap_or_else(default_frame_paths),
                sensor_path: device
                    .sensor_path
                    .unwrap_or_else(|| DEFAULT_SENSOR_PATH.to_string()),
                result_path: device
                    .result_path
                    .unwrap_or_else(|| DEFAULT_RESULT_PATH.to_string()),
                discovery_path: device
                    .discovery_path
                    .unwrap_or_else(|| DEFAULT_DISCOVERY_PATH.to_string()),
                frame_timeout: Duration::from_millis(
                    device.frame_timeout_ms.unwrap_or(DEFAULT_FRAME_TIMEOUT_MS),
                ),
                sensor_timeout: Duration::from_millis(
                    device
                        .sensor_timeout_ms
                        .unwrap_or(DEFAULT_SENSOR_TIMEOUT_MS),
                ),
                report_timeout: Duration::from_millis(
                    device
                        .report_timeout_ms
                        .unwrap_or(DEFAULT_REPORT_TIMEOUT_MS),
                ),
                discovery_timeout: Duration::from_millis(
                    device
                        .discovery_timeout_ms
                        .unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_MS),
                ),
                max_frame_width: device.max_frame_width.unwrap_or(DEFAULT_MAX_FRAME_WIDTH),
            },
            detector: DetectorSettings {
                variant: detector
                    .variant
                    .unwrap_or_else(|| DEFAULT_DETECTOR.to_string()),
                confidence_threshold: detector
                    .confidence_threshold
                    .unwrap_or(DEFAULT_DETECTOR_CONFIDENCE),
            },
            post: PostSettings {
                confidence_threshold: post
                    .confidence_threshold
                    .unwrap_or(DEFAULT_POST_CONFIDENCE),
                smoothing_window: post.smoothing_window.unwrap_or(DEFAULT_SMOOTHING_WINDOW),
            },
            loop_control: LoopControlSettings {
                rediscovery_interval: Duration::from_secs(
                    loop_control
                        .rediscovery_interval_secs
                        .unwrap_or(DEFAULT_REDISCOVERY_SECS),
                ),
                failure_streak: loop_control.failure_streak.unwrap_or(DEFAULT_FAILURE_STREAK),
                stats_interval: Duration::from_secs(
                    loop_control
                        .stats_interval_secs
                        .unwrap_or(DEFAULT_STATS_INTERVAL_SECS),
                ),
                idle_backoff: Duration::from_millis(
                    loop_control.idle_backoff_ms.unwrap_or(DEFAULT_IDLE_BACKOFF_MS),
                ),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("PERCEPT_DEVICE_ADDR") {
            if !addr.trim().is_empty() {
                self.device.address = addr;
            }
        }
        if let Ok(paths) = std::env::var("PERCEPT_FRAME_PATHS") {
            let parsed = split_csv(&paths);
            if !parsed.is_empty() {
                self.device.frame_paths = parsed;
            }
        }
        if let Ok(variant) = std::env::var("PERCEPT_DETECTOR") {
            if !variant.trim().is_empty() {
                self.detector.variant = variant;
            }
        }
        if let Ok(threshold) = std::env::var("PERCEPT_CONFIDENCE_THRESHOLD") {
            let value: f32 = threshold.parse().map_err(|_| {
                anyhow!("PERCEPT_CONFIDENCE_THRESHOLD must be a number in [0,1]")
            })?;
            self.detector.confidence_threshold = value;
        }
        if let Ok(secs) = std::env::var("PERCEPT_REDISCOVERY_SECS") {
            let seconds: u64 = secs
                .parse()
                .map_err(|_| anyhow!("PERCEPT_REDISCOVERY_SECS must be an integer"))?;
            self.loop_control.rediscovery_interval = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        validate_device_address(&self.device.address)?;

        if self.device.frame_paths.is_empty() {
            return Err(anyhow!("at least one frame capture path is required"));
        }
        for path in self
            .device
            .frame_paths
            .iter()
            .chain([
                &self.device.sensor_path,
                &self.device.result_path,
                &self.device.discovery_path,
            ])
        {
            if !path.starts_with('/') {
                return Err(anyhow!("capability path '{}' must start with '/'", path));
            }
        }

        validate_timeout("frame", self.device.frame_timeout, 5_000)?;
        validate_timeout("sensor", self.device.sensor_timeout, 1_000)?;
        validate_timeout("report", self.device.report_timeout, 1_000)?;
        validate_timeout("discovery", self.device.discovery_timeout, 5_000)?;

        if self.device.max_frame_width == 0 {
            return Err(anyhow!("max_frame_width must be greater than zero"));
        }
        match self.detector.variant.as_str() {
            "neural" | "ensemble" | "people" => {}
            other => {
                return Err(anyhow!(
                    "unknown detector variant '{}' (expected neural, ensemble or people)",
                    other
                ))
            }
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(anyhow!("detector confidence_threshold must be in [0,1]"));
        }
        if !(0.0..=1.0).contains(&self.post.confidence_threshold) {
            return Err(anyhow!("post confidence_threshold must be in [0,1]"));
        }
        if !(3..=5).contains(&self.post.smoothing_window) {
            return Err(anyhow!("smoothing_window must be between 3 and 5"));
        }
        if self.loop_control.failure_streak == 0 {
            return Err(anyhow!("failure_streak must be at least 1"));
        }
        if self.loop_control.rediscovery_interval.is_zero() {
            return Err(anyhow!("rediscovery interval must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for PerceptdConfig {
    fn default() -> Self {
        Self::from_file(PerceptdConfigFile::default())
    }
}

fn validate_timeout(name: &str, value: Duration, max_ms: u64) -> Result<()> {
    let ms = value.as_millis() as u64;
    if ms == 0 || ms > max_ms {
        return Err(anyhow!(
            "{} timeout must be between 1 and {} ms, got {}",
            name,
            max_ms,
            ms
        ));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<PerceptdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
