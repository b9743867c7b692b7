//! Frame capture from the device.
//!
//! Fetches a single JPEG per call. Different ESP32-CAM firmwares expose the
//! snapshot under different paths, so the source walks an ordered list of
//! capture paths and remembers which one answered last; that path is
//! tried first on the next call.

use anyhow::{Context, Result};
use std::time::Duration;

use super::{http::BoundedClient, Endpoint};
use crate::frame::Frame;

/// Fetches and decodes frames; all failures collapse to `None`.
pub struct FrameSource {
    client: BoundedClient,
    max_width: u32,
    preferred_path: usize,
}

impl FrameSource {
    pub fn new(timeout: Duration, max_width: u32) -> Self {
        Self {
            client: BoundedClient::new(timeout),
            max_width,
            preferred_path: 0,
        }
    }

    /// Fetch one frame, or `None` when the device is unavailable.
    ///
    /// A non-200 status, transport fault, or decode failure on one path
    /// moves on to the next; only after every path has failed does the call
    /// report the device as unavailable.
    pub fn fetch(&mut self, endpoint: &Endpoint) -> Option<Frame> {
        let paths = &endpoint.paths.frame;
        if paths.is_empty() {
            log::warn!("no frame capture paths configured");
            return None;
        }
        for attempt in 0..paths.len() {
            let index = (self.preferred_path + attempt) % paths.len();
            let url = endpoint.url_for(&paths[index]);
            let Some(bytes) = self.client.get_bytes(&url) else {
                continue;
            };
            match decode_frame(&bytes, self.max_width) {
                Ok(frame) => {
                    self.preferred_path = index;
                    return Some(frame);
                }
                Err(e) => {
                    log::debug!("frame decode failed for {}: {}", url, e);
                    continue;
                }
            }
        }
        None
    }
}

/// Decode a JPEG payload and downscale wide frames.
///
/// Frames wider than `max_width` are scaled down preserving aspect ratio
/// with integer target dimensions, so the same payload always yields the
/// same frame size.
fn decode_frame(bytes: &[u8], max_width: u32) -> Result<Frame> {
    let decoded = image::load_from_memory(bytes).context("decode frame payload")?;
    let rgb = decoded.into_rgb8();
    let (width, height) = rgb.dimensions();
    let frame = Frame::new(rgb.into_raw(), width, height)?;
    if width <= max_width {
        return Ok(frame);
    }
    let scaled_height = ((height as u64 * max_width as u64) / width as u64).max(1) as u32;
    frame.resized(max_width, scaled_height)
}
