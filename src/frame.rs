//! Frame data owned by a single perception cycle.
//!
//! A `Frame` is produced by the device frame source, handed to a detector
//! and the post-processor, and discarded when the cycle ends. It is never
//! mutated after construction.

use anyhow::{anyhow, Result};
use std::time::Instant;

/// A decoded RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Packed RGB8 pixels, `height * width * 3` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture time on the host side (set when the payload was decoded).
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            captured_at: Instant::now(),
        })
    }

    /// Resample to the given dimensions.
    ///
    /// Deterministic: the same input always produces the same output bytes.
    pub fn resized(&self, width: u32, height: u32) -> Result<Frame> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let source = image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match dimensions"))?;
        let resized =
            image::imageops::resize(&source, width, height, image::imageops::FilterType::Triangle);
        Ok(Frame {
            pixels: resized.into_raw(),
            width,
            height,
            captured_at: self.captured_at,
        })
    }
}
