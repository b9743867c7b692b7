//! Bounded device calls.
//!
//! Every network exchange with the device goes through [`BoundedClient`]:
//! one timeout per call, no retries, and every failure mode (timeout,
//! refused connection, non-200 status, oversized or malformed body)
//! collapses into a sentinel return value. Callers never see a transport
//! error as an `Err`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::time::Duration;

/// Upper bound on any device response body. Capture payloads are the
/// largest; a full-resolution JPEG stays well under this.
const MAX_BODY_BYTES: u64 = 5 * 1024 * 1024;

/// HTTP client with a fixed per-call timeout.
pub struct BoundedClient {
    agent: ureq::Agent,
}

impl BoundedClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    /// GET raw bytes. `None` on any failure or an empty body.
    pub fn get_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(e) => {
                log::debug!("GET {} failed: {}", url, e);
                return None;
            }
        };
        let mut bytes = Vec::new();
        let mut reader = response.into_reader().take(MAX_BODY_BYTES + 1);
        if let Err(e) = reader.read_to_end(&mut bytes) {
            log::debug!("GET {} body read failed: {}", url, e);
            return None;
        }
        if bytes.is_empty() {
            log::debug!("GET {} returned an empty body", url);
            return None;
        }
        if bytes.len() as u64 > MAX_BODY_BYTES {
            log::debug!("GET {} body exceeded {} bytes", url, MAX_BODY_BYTES);
            return None;
        }
        Some(bytes)
    }

    /// GET and deserialize a JSON body. `None` on any failure.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(e) => {
                log::debug!("GET {} failed: {}", url, e);
                return None;
            }
        };
        match response.into_json::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("GET {} returned malformed JSON: {}", url, e);
                None
            }
        }
    }

    /// POST a JSON body. `true` only on a 2xx response.
    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> bool {
        match self.agent.post(url).send_json(body) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("POST {} failed: {}", url, e);
                false
            }
        }
    }
}
