use crate::error::{CloakError, Result};
use image::{GrayImage, ImageBuffer, Rgb};

/// 8-bit, 3-channel frame with channels stored in B, G, R order.
///
/// `image` has no BGR pixel type, so the `Rgb` container is reused and
/// channel 0 holds blue.
pub type BgrImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// 8-bit HSV image: channel 0 is hue in [0, 180), channels 1 and 2 are
/// saturation and value in [0, 255].
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Per-pixel cloak classification, one of [`CLOAK`] or [`BACKGROUND`].
/// Dimensions match the frame it was computed from.
pub type Mask = GrayImage;

/// Mask value for pixels matching the cloak color
pub const CLOAK: u8 = 255;

/// Mask value for everything else
pub const BACKGROUND: u8 = 0;

/// Exclusive upper limit of the 8-bit hue channel
pub const HUE_LIMIT: u8 = 180;

/// Inclusive HSV bounds of the cloak color.
///
/// Both bounds are `[hue, saturation, value]`. Construction validates the
/// bounds, so a `ColorRange` in hand is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    lower: [u8; 3],
    upper: [u8; 3],
}

impl ColorRange {
    /// Default blue cloak, matching saturated mid-to-bright blues
    pub const BLUE: ColorRange = ColorRange {
        lower: [90, 50, 50],
        upper: [130, 255, 255],
    };

    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Result<Self> {
        for (bound, name) in [(lower[0], "lower"), (upper[0], "upper")] {
            if bound >= HUE_LIMIT {
                return Err(CloakError::Configuration(format!(
                    "{} hue bound {} is outside [0, {})",
                    name, bound, HUE_LIMIT
                )));
            }
        }

        for (channel, name) in ["hue", "saturation", "value"].iter().enumerate() {
            if lower[channel] > upper[channel] {
                return Err(CloakError::Configuration(format!(
                    "lower {} bound {} exceeds upper bound {}",
                    name, lower[channel], upper[channel]
                )));
            }
        }

        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> [u8; 3] {
        self.lower
    }

    pub fn upper(&self) -> [u8; 3] {
        self.upper
    }

    /// True iff every channel of `hsv` lies within the inclusive bounds
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::BLUE
    }
}
