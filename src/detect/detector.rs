//! Detector contract and collaborator seams.
//!
//! Detector variants differ only in algorithm; they all take a frame and
//! return raw, unfiltered detections. The heavy collaborators (neural
//! models and per-class region classifiers) live behind traits so the
//! crate never touches model weight formats or cascade files.

use anyhow::Result;

use crate::frame::Frame;

/// Axis-aligned pixel rectangle, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Clip to frame bounds, keeping the box non-negative in size.
    pub fn clamped(self, frame_w: u32, frame_h: u32) -> BBox {
        let x = self.x.min(frame_w);
        let y = self.y.min(frame_h);
        BBox {
            x,
            y,
            w: self.w.min(frame_w - x),
            h: self.h.min(frame_h - y),
        }
    }
}

/// Which detector variant produced a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorKind {
    Neural,
    Ensemble,
    People,
}

/// An unfiltered detection straight out of a detector variant.
#[derive(Clone, Debug)]
pub struct RawDetection {
    pub class_label: String,
    pub bbox: BBox,
    /// In [0,1]. Region classifiers report binary presence as 1.0.
    pub raw_confidence: f32,
    pub source: DetectorKind,
}

/// A detector variant.
pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Run inference on one frame.
    ///
    /// An `Err` is fatal for the current cycle only: the session logs it
    /// and carries on with an empty detection list.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>>;

    /// Adjust the variant's confidence threshold, where it has one.
    fn set_confidence_threshold(&mut self, _threshold: f32) {}
}

/// One raw output row from a neural model.
///
/// Box corners are normalized to [0,1] of the model input; the detector
/// scales them to frame pixels.
#[derive(Clone, Copy, Debug)]
pub struct ModelOutput {
    pub class_id: usize,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Single-pass neural model collaborator.
///
/// Loading weights and running the forward pass happen behind this seam;
/// the crate only sees normalized outputs.
pub trait InferenceModel: Send {
    fn name(&self) -> &'static str;

    /// Fixed input size the frame must be resampled to.
    fn input_size(&self) -> (u32, u32);

    /// One forward pass over RGB8 pixels of exactly `input_size()`.
    fn forward(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<ModelOutput>>;

    fn class_label(&self, class_id: usize) -> &str;
}

/// Scan tuning for a region classifier.
#[derive(Clone, Copy, Debug)]
pub struct ClassifierTuning {
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_size: (u32, u32),
}

impl Default for ClassifierTuning {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (25, 25),
        }
    }
}

/// Specialized single-class region classifier collaborator (e.g. a trained
/// cascade). Reports regions only; presence is binary.
pub trait RegionClassifier: Send {
    fn name(&self) -> &'static str;

    fn scan(&mut self, frame: &Frame, tuning: &ClassifierTuning) -> Result<Vec<BBox>>;
}
