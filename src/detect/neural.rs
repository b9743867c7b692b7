//! Single-pass neural detector variant.

use anyhow::Result;

use super::detector::{BBox, Detector, DetectorKind, InferenceModel, RawDetection};
use crate::frame::Frame;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Runs one forward pass of a fixed-input-size model per frame and keeps
/// outputs above the confidence threshold.
pub struct NeuralDetector {
    model: Box<dyn InferenceModel>,
    confidence_threshold: f32,
}

impl NeuralDetector {
    pub fn new(model: Box<dyn InferenceModel>) -> Self {
        Self {
            model,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

impl Detector for NeuralDetector {
    fn name(&self) -> &'static str {
        "neural"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        let (input_w, input_h) = self.model.input_size();
        let input = frame.resized(input_w, input_h)?;
        let outputs = self.model.forward(&input.pixels, input.width, input.height)?;

        let mut detections = Vec::new();
        for output in outputs {
            if output.confidence <= self.confidence_threshold {
                continue;
            }
            let Some(bbox) = scale_to_frame(&output, frame.width, frame.height) else {
                continue;
            };
            detections.push(RawDetection {
                class_label: self.model.class_label(output.class_id).to_string(),
                bbox,
                raw_confidence: output.confidence.clamp(0.0, 1.0),
                source: DetectorKind::Neural,
            });
        }
        Ok(detections)
    }

    fn set_confidence_threshold(&mut self, threshold: f32) {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
    }
}

/// Map normalized model corners to a clamped pixel box. Degenerate boxes
/// (zero area after clamping) are dropped.
fn scale_to_frame(output: &super::detector::ModelOutput, width: u32, height: u32) -> Option<BBox> {
    let scale = |v: f32, extent: u32| -> u32 {
        (v.clamp(0.0, 1.0) * extent as f32).round() as u32
    };
    let x1 = scale(output.x1, width);
    let y1 = scale(output.y1, height);
    let x2 = scale(output.x2, width);
    let y2 = scale(output.y2, height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    let bbox = BBox::new(x1, y1, x2 - x1, y2 - y1).clamped(width, height);
    (bbox.area() > 0).then_some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detector::ModelOutput;

    struct FixedModel {
        outputs: Vec<ModelOutput>,
    }

    impl InferenceModel for FixedModel {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn input_size(&self) -> (u32, u32) {
            (300, 300)
        }

        fn forward(
            &mut self,
            _pixels: &[u8],
            width: u32,
            height: u32,
        ) -> Result<Vec<ModelOutput>> {
            debug_assert_eq!((width, height), self.input_size());
            Ok(self.outputs.clone())
        }

        fn class_label(&self, class_id: usize) -> &str {
            match class_id {
                7 => "car",
                15 => "person",
                _ => "background",
            }
        }
    }

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 3) as usize], width, height).unwrap()
    }

    fn output(class_id: usize, confidence: f32, corners: [f32; 4]) -> ModelOutput {
        ModelOutput {
            class_id,
            confidence,
            x1: corners[0],
            y1: corners[1],
            x2: corners[2],
            y2: corners[3],
        }
    }

    #[test]
    fn resizes_to_model_input_and_thresholds() {
        let model = FixedModel {
            outputs: vec![
                output(7, 0.9, [0.25, 0.25, 0.5, 0.75]),
                output(15, 0.3, [0.0, 0.0, 0.5, 0.5]),
            ],
        };
        let mut detector = NeuralDetector::new(Box::new(model));
        let detections = detector.infer(&frame(640, 480)).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_label, "car");
        assert_eq!(detections[0].bbox, BBox::new(160, 120, 160, 240));
        assert_eq!(detections[0].source, DetectorKind::Neural);
    }

    #[test]
    fn clamps_boxes_spilling_past_the_frame() {
        let model = FixedModel {
            outputs: vec![output(7, 0.8, [0.9, 0.9, 1.5, 1.8])],
        };
        let mut detector = NeuralDetector::new(Box::new(model));
        let detections = detector.infer(&frame(640, 480)).unwrap();

        assert_eq!(detections.len(), 1);
        let bbox = detections[0].bbox;
        assert!(bbox.right() <= 640 && bbox.bottom() <= 480);
    }

    #[test]
    fn threshold_is_adjustable_at_runtime() {
        let model = FixedModel {
            outputs: vec![output(15, 0.45, [0.1, 0.1, 0.4, 0.9])],
        };
        let mut detector = NeuralDetector::new(Box::new(model));
        assert!(detector.infer(&frame(640, 480)).unwrap().is_empty());

        detector.set_confidence_threshold(0.4);
        assert_eq!(detector.infer(&frame(640, 480)).unwrap().len(), 1);
    }
}
