//! Device address discovery.
//!
//! ESP32-CAM firmware keeps a soft-AP address alive and reports its current
//! station address on the discovery capability. The locator asks the
//! preferred (usually current) address what the device believes its address
//! is; a reachable, connected device may advertise a new one.

use serde::Deserialize;
use std::time::Duration;

use super::{http::BoundedClient, validate_device_address, CapabilityPaths, Endpoint};

#[derive(Debug, Deserialize)]
struct DiscoveryStatus {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    status: String,
}

/// Resolves (and re-resolves) the device endpoint.
pub struct DeviceLocator {
    client: BoundedClient,
    paths: CapabilityPaths,
}

impl DeviceLocator {
    pub fn new(paths: CapabilityPaths, timeout: Duration) -> Self {
        Self {
            client: BoundedClient::new(timeout),
            paths,
        }
    }

    /// Resolve the endpoint to use next.
    ///
    /// Returns an endpoint bound to the advertised address when the device
    /// answers with `status == "connected"` and a usable address; otherwise
    /// an endpoint bound to `preferred` unchanged. Falling back is not a
    /// failure; an unreachable device is retried at the same address.
    pub fn resolve(&self, preferred: &str) -> Endpoint {
        let url = format!("http://{}{}", preferred, self.paths.discovery);
        let Some(status) = self.client.get_json::<DiscoveryStatus>(&url) else {
            log::debug!("discovery unreachable at {}, keeping {}", url, preferred);
            return Endpoint::bind(preferred, self.paths.clone());
        };

        if status.status != "connected" || status.ip.is_empty() {
            log::debug!(
                "device at {} not connected (status='{}'), keeping address",
                preferred,
                status.status
            );
            return Endpoint::bind(preferred, self.paths.clone());
        }

        if let Err(e) = validate_device_address(&status.ip) {
            log::warn!("device advertised unusable address: {}", e);
            return Endpoint::bind(preferred, self.paths.clone());
        }

        if status.ip != preferred {
            log::info!("device address changed: {} -> {}", preferred, status.ip);
        }
        Endpoint::bind(status.ip, self.paths.clone())
    }
}
