//! Result upload back to the device.
//!
//! The device displays the fused result locally (distance, alert state,
//! object list), so every cycle pushes one JSON document to the result
//! capability. Upload failures feed the endpoint's failure streak, which
//! the session uses to trigger rediscovery; they never stall the loop.

use serde::Serialize;
use std::time::Duration;

use super::{http::BoundedClient, Endpoint};
use crate::fuse::FusedResult;
use crate::post::CleanDetection;

#[derive(Serialize)]
struct ResultPayload<'a> {
    distance_mm: i64,
    pip: &'a str,
    pip_alert: bool,
    objects: Vec<WireDetection<'a>>,
}

#[derive(Serialize)]
struct WireDetection<'a> {
    class: &'a str,
    bbox: [u32; 4],
    confidence: f32,
}

impl<'a> From<&'a CleanDetection> for WireDetection<'a> {
    fn from(det: &'a CleanDetection) -> Self {
        Self {
            class: &det.class_label,
            bbox: [det.bbox.x, det.bbox.y, det.bbox.w, det.bbox.h],
            confidence: det.confidence,
        }
    }
}

/// Pushes fused results to the device.
pub struct ResultReporter {
    client: BoundedClient,
}

impl ResultReporter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: BoundedClient::new(timeout),
        }
    }

    /// POST the fused result. Returns `true` on a 2xx response.
    ///
    /// Success resets the endpoint failure streak; failure increments it.
    pub fn report(&self, endpoint: &mut Endpoint, result: &FusedResult) -> bool {
        let payload = ResultPayload {
            distance_mm: result.distance_mm,
            pip: &result.proximity_code,
            pip_alert: result.alert,
            objects: result.objects.iter().map(WireDetection::from).collect(),
        };
        let url = endpoint.url_for(&endpoint.paths.result);
        let ok = self.client.post_json(&url, &payload);
        if ok {
            endpoint.mark_success();
        } else {
            endpoint.mark_failure();
            log::debug!(
                "result upload to {} failed ({} consecutive)",
                url,
                endpoint.consecutive_failures
            );
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;

    #[test]
    fn wire_payload_matches_device_schema() {
        let result = FusedResult {
            distance_mm: 412,
            proximity_code: "P1".to_string(),
            alert: true,
            objects: vec![CleanDetection {
                class_label: "car".to_string(),
                bbox: BBox::new(100, 100, 80, 60),
                confidence: 0.7,
            }],
        };
        let payload = ResultPayload {
            distance_mm: result.distance_mm,
            pip: &result.proximity_code,
            pip_alert: result.alert,
            objects: result.objects.iter().map(WireDetection::from).collect(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["distance_mm"], 412);
        assert_eq!(json["pip"], "P1");
        assert_eq!(json["pip_alert"], true);
        assert_eq!(json["objects"][0]["class"], "car");
        assert_eq!(json["objects"][0]["bbox"][2], 80);
    }
}
