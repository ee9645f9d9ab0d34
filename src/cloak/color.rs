use super::types::{BgrImage, ColorRange, HsvImage, Mask, BACKGROUND, CLOAK, HUE_LIMIT};
use image::{Luma, Rgb};
use std::sync::OnceLock;

const HSV_SHIFT: i32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);

/// Reciprocal tables for 8-bit HSV conversion in 12-bit fixed point.
///
/// `saturation[v]` ~ 255 / v and `hue[d]` ~ 180 / (6 * d), both scaled by 2^12.
/// Index 0 maps to 0 so grey pixels get zero saturation and zero hue.
struct DivTables {
    saturation: [i32; 256],
    hue: [i32; 256],
}

fn div_tables() -> &'static DivTables {
    static TABLES: OnceLock<DivTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut saturation = [0i32; 256];
        let mut hue = [0i32; 256];
        for i in 1..256 {
            saturation[i] = ((255 << HSV_SHIFT) as f64 / i as f64).round() as i32;
            hue[i] = (((HUE_LIMIT as i32) << HSV_SHIFT) as f64 / (6 * i) as f64).round() as i32;
        }
        DivTables { saturation, hue }
    })
}

/// Convert one BGR pixel to 8-bit HSV
#[inline]
pub fn pixel_to_hsv(bgr: [u8; 3]) -> [u8; 3] {
    let tables = div_tables();
    let (b, g, r) = (bgr[0] as i32, bgr[1] as i32, bgr[2] as i32);

    let v = b.max(g).max(r);
    let diff = v - b.min(g).min(r);

    let s = (diff * tables.saturation[v as usize] + HSV_ROUND) >> HSV_SHIFT;

    // Hue in units of diff / 6 of a full turn, offset by which channel is the max
    let h = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (h * tables.hue[diff as usize] + HSV_ROUND) >> HSV_SHIFT;
    if h < 0 {
        h += HUE_LIMIT as i32;
    }

    [h as u8, s as u8, v as u8]
}

/// Convert a BGR frame to HSV (hue in [0, 180), saturation and value in [0, 255])
pub fn bgr_to_hsv(frame: &BgrImage) -> HsvImage {
    let _span = tracing::debug_span!("bgr_to_hsv").entered();

    let (width, height) = frame.dimensions();
    let mut hsv = HsvImage::new(width, height);
    for (src, dst) in frame.pixels().zip(hsv.pixels_mut()) {
        *dst = Rgb(pixel_to_hsv(src.0));
    }
    hsv
}

/// Threshold an HSV image against `range`, inclusive on both ends
pub fn in_range(hsv: &HsvImage, range: &ColorRange) -> Mask {
    let _span = tracing::debug_span!("in_range").entered();

    let (width, height) = hsv.dimensions();
    let mut mask = Mask::new(width, height);
    for (src, dst) in hsv.pixels().zip(mask.pixels_mut()) {
        *dst = Luma([if range.contains(src.0) { CLOAK } else { BACKGROUND }]);
    }
    mask
}
