//! Multi-classifier ensemble detector variant.
//!
//! One independent region classifier per target class, each with its own
//! scan tuning. Presence is binary, so raw confidence is always 1.0; the
//! post-processor's heuristics take it from there.

use anyhow::Result;

use super::detector::{
    ClassifierTuning, Detector, DetectorKind, RawDetection, RegionClassifier,
};
use crate::frame::Frame;

/// One class-specialized stage of the ensemble.
pub struct EnsembleStage {
    pub label: String,
    pub tuning: ClassifierTuning,
    pub classifier: Box<dyn RegionClassifier>,
}

impl EnsembleStage {
    pub fn new(
        label: impl Into<String>,
        tuning: ClassifierTuning,
        classifier: Box<dyn RegionClassifier>,
    ) -> Self {
        Self {
            label: label.into(),
            tuning,
            classifier,
        }
    }
}

/// Default ensemble line-up. The smile class is deliberately absent; it
/// fires on almost anything at these frame sizes.
pub fn default_stage_labels() -> &'static [&'static str] {
    &["car", "eye", "watch", "clock"]
}

/// Scan tunings that work well per class; larger minimum sizes cut noise
/// for classes that only occur at scale.
pub fn stage_tuning(label: &str) -> ClassifierTuning {
    match label {
        "car" => ClassifierTuning {
            scale_factor: 1.1,
            min_neighbors: 4,
            min_size: (50, 50),
        },
        "eye" => ClassifierTuning {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (15, 15),
        },
        _ => ClassifierTuning::default(),
    }
}

/// Runs every stage over the frame and concatenates the results in stage
/// order.
pub struct EnsembleDetector {
    stages: Vec<EnsembleStage>,
}

impl EnsembleDetector {
    pub fn new(stages: Vec<EnsembleStage>) -> Self {
        Self { stages }
    }

    pub fn stage_labels(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.label.as_str())
    }
}

impl Detector for EnsembleDetector {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        let mut detections = Vec::new();
        for stage in &mut self.stages {
            let regions = stage.classifier.scan(frame, &stage.tuning)?;
            for bbox in regions {
                let bbox = bbox.clamped(frame.width, frame.height);
                if bbox.area() == 0 {
                    continue;
                }
                detections.push(RawDetection {
                    class_label: stage.label.clone(),
                    bbox,
                    raw_confidence: 1.0,
                    source: DetectorKind::Ensemble,
                });
            }
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detector::BBox;

    struct FixedClassifier {
        regions: Vec<BBox>,
    }

    impl RegionClassifier for FixedClassifier {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn scan(&mut self, _frame: &Frame, _tuning: &ClassifierTuning) -> Result<Vec<BBox>> {
            Ok(self.regions.clone())
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 640 * 480 * 3], 640, 480).unwrap()
    }

    #[test]
    fn stages_emit_their_label_with_unit_confidence() {
        let mut detector = EnsembleDetector::new(vec![
            EnsembleStage::new(
                "car",
                stage_tuning("car"),
                Box::new(FixedClassifier {
                    regions: vec![BBox::new(100, 100, 80, 60)],
                }),
            ),
            EnsembleStage::new(
                "clock",
                stage_tuning("clock"),
                Box::new(FixedClassifier {
                    regions: vec![BBox::new(10, 10, 30, 30), BBox::new(200, 50, 40, 40)],
                }),
            ),
        ]);

        let detections = detector.infer(&frame()).unwrap();
        assert_eq!(detections.len(), 3);
        assert_eq!(detections[0].class_label, "car");
        assert_eq!(detections[1].class_label, "clock");
        assert!(detections.iter().all(|d| d.raw_confidence == 1.0));
        assert!(detections
            .iter()
            .all(|d| d.source == DetectorKind::Ensemble));
    }

    #[test]
    fn car_tuning_requires_larger_regions() {
        let tuning = stage_tuning("car");
        assert_eq!(tuning.min_size, (50, 50));
        assert_eq!(tuning.min_neighbors, 4);
    }
}
