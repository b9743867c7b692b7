//! Sensor fusion.
//!
//! Combines one proximity reading with the cleaned detection set. Pure:
//! no I/O, no hidden state.

use crate::device::{SensorReading, NO_PROXIMITY_CODE};
use crate::post::CleanDetection;

/// The fused per-cycle result pushed back to the device.
#[derive(Clone, Debug)]
pub struct FusedResult {
    pub distance_mm: i64,
    pub proximity_code: String,
    /// True iff the device reported a real proximity condition.
    pub alert: bool,
    /// Cleaned detections in detector emission order.
    pub objects: Vec<CleanDetection>,
}

/// Fuse a sensor reading with the cleaned detections.
///
/// `alert` is raised exactly when the proximity code is present and not a
/// sentinel; object ordering is preserved as emitted.
pub fn fuse(reading: &SensorReading, objects: Vec<CleanDetection>) -> FusedResult {
    let code = reading.proximity_code.as_str();
    FusedResult {
        distance_mm: reading.distance_mm,
        proximity_code: reading.proximity_code.clone(),
        alert: !code.is_empty() && code != NO_PROXIMITY_CODE,
        objects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;
    use std::time::Instant;

    fn reading(distance_mm: i64, code: &str) -> SensorReading {
        SensorReading {
            distance_mm,
            proximity_code: code.to_string(),
            read_at: Instant::now(),
        }
    }

    #[test]
    fn sentinel_code_means_no_alert() {
        assert!(!fuse(&reading(-1, "NONE"), Vec::new()).alert);
        assert!(!fuse(&reading(300, ""), Vec::new()).alert);
    }

    #[test]
    fn real_code_raises_alert() {
        let result = fuse(&reading(412, "P1"), Vec::new());
        assert!(result.alert);
        assert_eq!(result.distance_mm, 412);
        assert_eq!(result.proximity_code, "P1");
    }

    #[test]
    fn object_order_is_preserved() {
        let objects = vec![
            CleanDetection {
                class_label: "person".to_string(),
                bbox: BBox::new(10, 10, 50, 120),
                confidence: 0.9,
            },
            CleanDetection {
                class_label: "car".to_string(),
                bbox: BBox::new(300, 200, 90, 60),
                confidence: 0.7,
            },
        ];
        let result = fuse(&reading(-1, "NONE"), objects.clone());
        assert_eq!(result.objects, objects);
    }
}
