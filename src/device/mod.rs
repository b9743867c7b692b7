//! Device addressing and HTTP capabilities.
//!
//! The camera device exposes a small set of HTTP capabilities (frame
//! capture, proximity sensor, result upload, address discovery). Its
//! network address can change at any time, so the active [`Endpoint`] is a
//! value that gets replaced wholesale on rediscovery; in-flight operations
//! never observe a half-updated endpoint.

mod capture;
mod http;
mod locator;
mod reporter;
mod sensor;

pub use capture::FrameSource;
pub use http::BoundedClient;
pub use locator::DeviceLocator;
pub use reporter::ResultReporter;
pub use sensor::{SensorReader, SensorReading, NO_PROXIMITY_CODE};

use anyhow::{anyhow, Context, Result};
use std::time::Instant;
use url::Url;

/// HTTP paths for the device capabilities consumed by the loop.
#[derive(Clone, Debug)]
pub struct CapabilityPaths {
    /// Ordered frame capture paths; earlier entries are preferred, later
    /// ones are firmware-specific fallbacks.
    pub frame: Vec<String>,
    pub sensor: String,
    pub result: String,
    pub discovery: String,
}

impl Default for CapabilityPaths {
    fn default() -> Self {
        Self {
            frame: vec![
                "/capture".to_string(),
                "/cam-hi.jpg".to_string(),
                "/cam-lo.jpg".to_string(),
                "/jpg".to_string(),
            ],
            sensor: "/distance".to_string(),
            result: "/results".to_string(),
            discovery: "/ip".to_string(),
        }
    }
}

/// The currently active device binding.
///
/// Owned exclusively by the session loop. `consecutive_failures` counts
/// result-upload failures since the last success; rediscovery replaces the
/// whole value and therefore resets the counter.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub address: String,
    pub paths: CapabilityPaths,
    pub last_seen: Instant,
    pub consecutive_failures: u32,
}

impl Endpoint {
    pub fn bind(address: impl Into<String>, paths: CapabilityPaths) -> Self {
        Self {
            address: address.into(),
            paths,
            last_seen: Instant::now(),
            consecutive_failures: 0,
        }
    }

    /// Full URL for a capability path on this endpoint.
    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub fn mark_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_seen = Instant::now();
    }

    pub fn mark_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Check that a device address is a plain `host` or `host:port`.
///
/// Schemes and paths belong to the capability configuration, not the
/// address.
pub fn validate_device_address(address: &str) -> Result<()> {
    if address.trim().is_empty() {
        return Err(anyhow!("device address must not be empty"));
    }
    if address.contains('/') || address.contains("://") {
        return Err(anyhow!(
            "device address must be host[:port], got '{}'",
            address
        ));
    }
    let url = Url::parse(&format!("http://{}/", address))
        .with_context(|| format!("invalid device address '{}'", address))?;
    if url.host_str().is_none() {
        return Err(anyhow!("device address '{}' has no host", address));
    }
    Ok(())
}
