//! Auxiliary proximity sensor reads.

use serde::Deserialize;
use std::time::{Duration, Instant};

use super::{http::BoundedClient, Endpoint};

/// Proximity code reported when the device has no valid reading.
pub const NO_PROXIMITY_CODE: &str = "NONE";

fn default_distance() -> i64 {
    -1
}

fn default_code() -> String {
    NO_PROXIMITY_CODE.to_string()
}

#[derive(Debug, Deserialize)]
struct SensorPayload {
    #[serde(default = "default_distance")]
    distance_mm: i64,
    #[serde(default = "default_code")]
    pip: String,
}

/// One proximity reading. `distance_mm == -1` together with
/// `proximity_code == "NONE"` means "no valid reading".
#[derive(Clone, Debug)]
pub struct SensorReading {
    pub distance_mm: i64,
    pub proximity_code: String,
    pub read_at: Instant,
}

impl SensorReading {
    /// The sentinel reading used whenever the sensor is unavailable.
    pub fn none() -> Self {
        Self {
            distance_mm: -1,
            proximity_code: NO_PROXIMITY_CODE.to_string(),
            read_at: Instant::now(),
        }
    }
}

/// Reads the proximity capability with a short timeout so a stalled sensor
/// never holds up the frame pipeline beyond its own deadline.
pub struct SensorReader {
    client: BoundedClient,
}

impl SensorReader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: BoundedClient::new(timeout),
        }
    }

    /// Read the sensor; any failure yields the sentinel reading.
    pub fn read(&self, endpoint: &Endpoint) -> SensorReading {
        let url = endpoint.url_for(&endpoint.paths.sensor);
        match self.client.get_json::<SensorPayload>(&url) {
            Some(payload) => SensorReading {
                distance_mm: payload.distance_mm,
                proximity_code: payload.pip,
                read_at: Instant::now(),
            },
            None => SensorReading::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_reading_has_no_distance() {
        let reading = SensorReading::none();
        assert_eq!(reading.distance_mm, -1);
        assert_eq!(reading.proximity_code, NO_PROXIMITY_CODE);
    }

    #[test]
    fn payload_defaults_missing_fields_to_sentinels() {
        let payload: SensorPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.distance_mm, -1);
        assert_eq!(payload.pip, NO_PROXIMITY_CODE);
    }
}
