//! Dual people detector variant.
//!
//! Faces and bodies are scanned independently. Body regions are the
//! primary signal; face regions are only a fallback for frames where the
//! body classifier comes up empty (subject partially out of frame, seated,
//! or too close to the camera).

use anyhow::Result;

use super::detector::{
    BBox, ClassifierTuning, Detector, DetectorKind, RawDetection, RegionClassifier,
};
use crate::frame::Frame;

const PERSON_LABEL: &str = "person";

fn face_tuning() -> ClassifierTuning {
    ClassifierTuning {
        scale_factor: 1.05,
        min_neighbors: 3,
        min_size: (20, 20),
    }
}

fn body_tuning() -> ClassifierTuning {
    ClassifierTuning {
        scale_factor: 1.1,
        min_neighbors: 3,
        min_size: (40, 40),
    }
}

/// Cross-validated face + body person detector.
pub struct PeopleDetector {
    face: Box<dyn RegionClassifier>,
    body: Box<dyn RegionClassifier>,
    face_tuning: ClassifierTuning,
    body_tuning: ClassifierTuning,
}

impl PeopleDetector {
    pub fn new(face: Box<dyn RegionClassifier>, body: Box<dyn RegionClassifier>) -> Self {
        Self {
            face,
            body,
            face_tuning: face_tuning(),
            body_tuning: body_tuning(),
        }
    }
}

impl Detector for PeopleDetector {
    fn name(&self) -> &'static str {
        "people"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        let faces = self.face.scan(frame, &self.face_tuning)?;
        let bodies = self.body.scan(frame, &self.body_tuning)?;

        let person = |bbox: BBox| RawDetection {
            class_label: PERSON_LABEL.to_string(),
            bbox,
            raw_confidence: 1.0,
            source: DetectorKind::People,
        };

        if !bodies.is_empty() {
            return Ok(bodies
                .into_iter()
                .map(|bbox| bbox.clamped(frame.width, frame.height))
                .filter(|bbox| bbox.area() > 0)
                .map(person)
                .collect());
        }

        // Heuristic fallback: estimate one person per detected face when no
        // body is found. Shoulders span roughly three face widths and the
        // torso extends about four face heights from the top of the head.
        Ok(faces
            .into_iter()
            .map(|face| person_from_face(face, frame.width, frame.height))
            .filter(|bbox| bbox.area() > 0)
            .map(person)
            .collect())
    }
}

fn person_from_face(face: BBox, frame_w: u32, frame_h: u32) -> BBox {
    let x = face.x.saturating_sub(face.w);
    let w = face.w.saturating_mul(3);
    let h = face.h.saturating_mul(4);
    BBox::new(x, face.y, w, h).clamped(frame_w, frame_h)
}
