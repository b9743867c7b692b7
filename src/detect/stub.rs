//! Inert model/classifier collaborators.
//!
//! Used when no real model or cascade files are wired in: the daemon can
//! run the whole loop against a live device and report empty object lists,
//! and tests can exercise detector plumbing without external files.

use anyhow::Result;

use super::detector::{BBox, ClassifierTuning, InferenceModel, ModelOutput, RegionClassifier};
use crate::frame::Frame;

/// Neural model stand-in: accepts any frame, emits nothing.
pub struct StubModel {
    input_size: (u32, u32),
}

impl StubModel {
    pub fn new() -> Self {
        Self {
            input_size: (300, 300),
        }
    }
}

impl Default for StubModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceModel for StubModel {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn forward(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<ModelOutput>> {
        Ok(Vec::new())
    }

    fn class_label(&self, _class_id: usize) -> &str {
        "unknown"
    }
}

/// Region classifier stand-in: never finds a region.
pub struct StubClassifier;

impl RegionClassifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn scan(&mut self, _frame: &Frame, _tuning: &ClassifierTuning) -> Result<Vec<BBox>> {
        Ok(Vec::new())
    }
}
