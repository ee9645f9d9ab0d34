mod v4l_capture;

pub use v4l_capture::WebcamCapture;

use crate::cloak::BgrImage;
use anyhow::Result;
use image::RgbImage;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame in BGR channel order
    fn capture_frame(&mut self) -> Result<BgrImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

/// Reorder an RGB frame into BGR, in place
pub fn rgb_into_bgr(mut frame: RgbImage) -> BgrImage {
    for pixel in frame.pixels_mut() {
        pixel.0.swap(0, 2);
    }
    frame
}
