//! Detection post-processing.
//!
//! Two transforms run in order over each frame's raw detections:
//!
//! 1. overlap suppression: boxes describing the same physical object
//!    (IoU above 0.3) are collapsed to the first-seen one;
//! 2. heuristic re-scoring: a size factor (is the box a plausible size
//!    for its class?) and a position factor (is it clipped at a frame
//!    edge?) multiply into a score that gates the detection.
//!
//! Survivors then update per-class count history, and only classes with
//! sustained evidence across recent frames are surfaced. Single-frame
//! flicker never reaches the fused result.

mod history;

pub use history::DetectionHistory;

use std::collections::{BTreeSet, HashMap};

use crate::detect::{BBox, RawDetection};

/// IoU above which two boxes are considered the same physical object.
pub const IOU_SUPPRESSION_THRESHOLD: f32 = 0.3;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
const DEFAULT_SMOOTHING_WINDOW: usize = 5;
/// Number of trailing history entries the surfacing decision looks at.
const SURFACE_WINDOW: usize = 3;
/// Minimum mean count over [`SURFACE_WINDOW`] entries for a class to be
/// trusted.
const SURFACE_MEAN_MIN: f32 = 1.5;
/// Boxes closer than this to a frame edge are treated as likely clipped.
const EDGE_MARGIN_PX: u32 = 10;

const SIZE_FACTOR_OUT_OF_RANGE: f32 = 0.3;
const POSITION_FACTOR_EDGE: f32 = 0.7;

/// A post-processed detection, ready for fusion and reporting.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanDetection {
    pub class_label: String,
    pub bbox: BBox,
    pub confidence: f32,
}

/// Intersection-over-Union of two boxes. Zero when either box is empty.
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let ix = a.right().min(b.right()).saturating_sub(a.x.max(b.x)) as u64;
    let iy = a.bottom().min(b.bottom()).saturating_sub(a.y.max(b.y)) as u64;
    let intersection = ix * iy;
    let union = a.area() + b.area() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f32 / union as f32
}

/// Drop detections overlapping an earlier-seen one above `threshold`.
///
/// First-seen wins; there is no score-based re-ranking at this stage, and
/// a single detection is always kept.
pub fn suppress_overlapping(detections: Vec<RawDetection>, threshold: f32) -> Vec<RawDetection> {
    let mut kept: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for detection in detections {
        let duplicate = kept
            .iter()
            .any(|earlier| iou(&earlier.bbox, &detection.bbox) > threshold);
        if !duplicate {
            kept.push(detection);
        }
    }
    kept
}

/// Expected on-screen box dimensions per class: (width, height) ranges in
/// pixels. Derived from what each class plausibly occupies in a ≤640px
/// frame; classes not listed carry no size prior.
fn expected_size_range(label: &str) -> Option<((u32, u32), (u32, u32))> {
    match label {
        "car" | "bus" | "truck" | "motorbike" | "motorcycle" => Some(((60, 300), (40, 240))),
        "person" => Some(((30, 220), (60, 420))),
        "bicycle" => Some(((40, 260), (40, 260))),
        "cat" | "dog" => Some(((30, 200), (30, 200))),
        "eye" => Some(((15, 80), (15, 80))),
        "watch" | "clock" => Some(((20, 160), (20, 160))),
        _ => None,
    }
}

fn size_factor(label: &str, bbox: &BBox) -> f32 {
    match expected_size_range(label) {
        Some(((w_min, w_max), (h_min, h_max))) => {
            if (w_min..=w_max).contains(&bbox.w) && (h_min..=h_max).contains(&bbox.h) {
                1.0
            } else {
                SIZE_FACTOR_OUT_OF_RANGE
            }
        }
        None => 1.0,
    }
}

fn position_factor(bbox: &BBox, frame_w: u32, frame_h: u32) -> f32 {
    let near_edge = bbox.x <= EDGE_MARGIN_PX
        || bbox.y <= EDGE_MARGIN_PX
        || bbox.right() >= frame_w.saturating_sub(EDGE_MARGIN_PX)
        || bbox.bottom() >= frame_h.saturating_sub(EDGE_MARGIN_PX);
    if near_edge {
        POSITION_FACTOR_EDGE
    } else {
        1.0
    }
}

/// Deduplicates, re-scores and temporally smooths raw detections.
///
/// Holds the per-class history, so one instance must live across cycles.
pub struct PostProcessor {
    confidence_threshold: f32,
    smoothing_window: usize,
    history: HashMap<String, DetectionHistory>,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, smoothing_window: usize) -> Self {
        Self {
            confidence_threshold,
            smoothing_window: smoothing_window.clamp(3, 5),
            history: HashMap::new(),
        }
    }

    /// Run both transforms and the hysteresis gate over one frame's raw
    /// detections. `frame_w`/`frame_h` are the dimensions of the frame the
    /// boxes live in.
    pub fn process(
        &mut self,
        raw: Vec<RawDetection>,
        frame_w: u32,
        frame_h: u32,
    ) -> Vec<CleanDetection> {
        let deduplicated = suppress_overlapping(raw, IOU_SUPPRESSION_THRESHOLD);

        let mut survivors: Vec<CleanDetection> = Vec::with_capacity(deduplicated.len());
        for detection in &deduplicated {
            let score = size_factor(&detection.class_label, &detection.bbox)
                * position_factor(&detection.bbox, frame_w, frame_h);
            if score < self.confidence_threshold {
                continue;
            }
            survivors.push(CleanDetection {
                class_label: detection.class_label.clone(),
                bbox: detection.bbox,
                confidence: (detection.raw_confidence * score).clamp(0.0, 1.0),
            });
        }

        self.update_history(&survivors);

        // Hysteresis: only classes with sustained recent counts surface.
        survivors.retain(|detection| {
            self.history
                .get(&detection.class_label)
                .map(|history| history.recent_mean(SURFACE_WINDOW) >= SURFACE_MEAN_MIN)
                .unwrap_or(false)
        });
        survivors
    }

    /// Push this frame's survivor count for every class we have ever seen;
    /// classes absent this frame get a 0 so their history decays.
    fn update_history(&mut self, survivors: &[CleanDetection]) {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for detection in survivors {
            *counts.entry(detection.class_label.as_str()).or_insert(0) += 1;
        }

        let labels: BTreeSet<String> = self
            .history
            .keys()
            .cloned()
            .chain(counts.keys().map(|label| label.to_string()))
            .collect();

        let window = self.smoothing_window;
        for label in labels {
            let count = counts.get(label.as_str()).copied().unwrap_or(0);
            self.history
                .entry(label)
                .or_insert_with(|| DetectionHistory::new(window))
                .push(count);
        }
    }

    /// Forget all accumulated history.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_SMOOTHING_WINDOW)
    }
}
