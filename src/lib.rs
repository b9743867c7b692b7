//! percept
//!
//! Host-side perception companion for ESP32-CAM class devices.
//!
//! The crate implements a resilient perception loop: pull a frame from an
//! unreliable networked camera, run a pluggable object detector, clean the
//! raw detections (overlap suppression, heuristic re-scoring, temporal
//! smoothing), fuse the result with an auxiliary proximity reading, and
//! push the fused result back to the device, all while the device's
//! address may change and its connection may drop at any time.
//!
//! # Module Structure
//!
//! - `device`: endpoint model and all device HTTP I/O (locator, frame
//!   source, sensor reader, result reporter) behind one bounded-call
//!   policy
//! - `detect`: detector contract and the neural / ensemble / people
//!   variants; models and cascades live behind collaborator traits
//! - `post`: detection post-processing (IoU dedup, re-scoring, hysteresis)
//! - `fuse`: sensor fusion
//! - `stats`: running counters
//! - `session`: the cycle loop, command queue and shutdown
//! - `config`: perceptd configuration (file + env)

pub mod config;
pub mod detect;
pub mod device;
pub mod frame;
pub mod fuse;
pub mod post;
pub mod session;
pub mod stats;

pub use config::PerceptdConfig;
pub use detect::{
    BBox, ClassifierTuning, Detector, DetectorKind, EnsembleDetector, EnsembleStage,
    InferenceModel, ModelOutput, NeuralDetector, PeopleDetector, RawDetection, RegionClassifier,
    StubClassifier, StubModel,
};
pub use device::{
    CapabilityPaths, DeviceLocator, Endpoint, FrameSource, ResultReporter, SensorReader,
    SensorReading,
};
pub use frame::Frame;
pub use fuse::{fuse, FusedResult};
pub use post::{CleanDetection, DetectionHistory, PostProcessor};
pub use session::{CycleOutcome, PerceptionSession, SessionCommand};
pub use stats::{StatsAggregator, StatsSnapshot};
