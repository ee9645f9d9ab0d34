//! Binary morphology on cloak masks with a 3x3 rectangular structuring element.
//!
//! Neighbours outside the image are ignored, which is the same as padding with
//! [`CLOAK`](super::types::CLOAK) for erosion and with
//! [`BACKGROUND`](super::types::BACKGROUND) for dilation. A region touching the
//! image border therefore neither shrinks from nor grows into the border.

use super::types::Mask;

/// Iterations of the opening that strips speckle from the raw mask
pub const OPEN_ITERATIONS: u32 = 2;

/// Iterations of the final dilation that restores eroded cloak edges
pub const DILATE_ITERATIONS: u32 = 1;

#[derive(Debug, Clone, Copy)]
enum Morph {
    Erode,
    Dilate,
}

impl Morph {
    #[inline]
    fn combine(self, a: u8, b: u8) -> u8 {
        match self {
            Morph::Erode => a.min(b),
            Morph::Dilate => a.max(b),
        }
    }
}

/// One 3x3 pass, split into a horizontal and a vertical 1x3 pass
fn apply_3x3(mask: &Mask, op: Morph) -> Mask {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as usize, height as usize);
    let src = mask.as_raw();

    let mut rows = vec![0u8; src.len()];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut value = row[x];
            if x > 0 {
                value = op.combine(value, row[x - 1]);
            }
            if x + 1 < w {
                value = op.combine(value, row[x + 1]);
            }
            rows[y * w + x] = value;
        }
    }

    let mut out = Mask::new(width, height);
    let dst: &mut [u8] = &mut out;
    for y in 0..h {
        for x in 0..w {
            let mut value = rows[y * w + x];
            if y > 0 {
                value = op.combine(value, rows[(y - 1) * w + x]);
            }
            if y + 1 < h {
                value = op.combine(value, rows[(y + 1) * w + x]);
            }
            dst[y * w + x] = value;
        }
    }

    out
}

fn repeat(mask: &Mask, op: Morph, iterations: u32) -> Mask {
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = apply_3x3(&current, op);
    }
    current
}

pub fn erode(mask: &Mask, iterations: u32) -> Mask {
    repeat(mask, Morph::Erode, iterations)
}

pub fn dilate(mask: &Mask, iterations: u32) -> Mask {
    repeat(mask, Morph::Dilate, iterations)
}

/// Morphological opening: `iterations` erosions followed by as many dilations
pub fn open(mask: &Mask, iterations: u32) -> Mask {
    dilate(&erode(mask, iterations), iterations)
}

/// Clean up a raw color mask.
///
/// The opening removes cloak regions too small to survive two erosions; the
/// dilation afterwards grows the surviving regions by one pixel so the edges
/// lost to thresholding get covered again.
pub fn refine_mask(mask: &Mask) -> Mask {
    let _span = tracing::debug_span!("refine_mask").entered();
    dilate(&open(mask, OPEN_ITERATIONS), DILATE_ITERATIONS)
}
