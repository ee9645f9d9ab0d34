use super::types::BgrImage;
use crate::error::{CloakError, Result};
use image::Rgb;
use ndarray::{s, aview1, Array2, ArrayView1, Axis};

/// Collects priming frames and collapses them into a single background frame.
///
/// Frames are stored as rows of a `frames_needed x (width * height * 3)`
/// stack, so the per-channel median is a reduction along axis 0. The stack is
/// allocated on the first frame, once the frame size is known.
pub struct BackgroundAccumulator {
    frames_needed: usize,
    captured: usize,
    dimensions: Option<(u32, u32)>,
    stack: Array2<u8>,
}

impl BackgroundAccumulator {
    pub fn new(frames_needed: usize) -> Self {
        Self {
            frames_needed,
            captured: 0,
            dimensions: None,
            stack: Array2::zeros((0, 0)),
        }
    }

    pub fn captured(&self) -> usize {
        self.captured
    }

    pub fn frames_needed(&self) -> usize {
        self.frames_needed
    }

    pub fn is_complete(&self) -> bool {
        self.captured >= self.frames_needed
    }

    /// Add a frame to the stack.
    ///
    /// The first frame fixes the expected dimensions. Frames pushed after the
    /// accumulator is complete are ignored.
    pub fn push(&mut self, frame: &BgrImage) -> Result<()> {
        let (width, height) = frame.dimensions();
        match self.dimensions {
            Some((expected_width, expected_height)) => {
                if (expected_width, expected_height) != (width, height) {
                    return Err(CloakError::DimensionMismatch {
                        expected_width,
                        expected_height,
                        actual_width: width,
                        actual_height: height,
                    });
                }
            }
            None => {
                tracing::debug!(
                    "Allocating background stack for {} frames of {}x{}",
                    self.frames_needed,
                    width,
                    height
                );
                self.dimensions = Some((width, height));
                self.stack = Array2::zeros((self.frames_needed, frame.as_raw().len()));
            }
        }

        if self.is_complete() {
            return Ok(());
        }

        self.stack
            .row_mut(self.captured)
            .assign(&aview1(frame.as_raw().as_slice()));
        self.captured += 1;
        Ok(())
    }

    /// Per-pixel, per-channel median of every captured frame.
    ///
    /// With an even number of frames the two middle samples are averaged and
    /// the result truncated, so `[3, 4]` gives 3.
    pub fn collapse(self) -> Result<BgrImage> {
        let (width, height) = self.dimensions.ok_or_else(|| {
            CloakError::Configuration("no frames to estimate a background from".to_string())
        })?;

        let _span = tracing::debug_span!("median_background", frames = self.captured).entered();

        let samples = self.stack.slice(s![..self.captured, ..]);
        let mut scratch = Vec::with_capacity(self.captured);
        let medians = samples.map_axis(Axis(0), |lane| median(&mut scratch, lane));

        let row = width as usize * 3;
        Ok(BgrImage::from_fn(width, height, |x, y| {
            let i = y as usize * row + x as usize * 3;
            Rgb([medians[i], medians[i + 1], medians[i + 2]])
        }))
    }
}

/// Median background of a fixed set of frames, all of the same size
pub fn median_background(frames: &[BgrImage]) -> Result<BgrImage> {
    let mut accumulator = BackgroundAccumulator::new(frames.len());
    for frame in frames {
        accumulator.push(frame)?;
    }
    accumulator.collapse()
}

fn median(scratch: &mut Vec<u8>, lane: ArrayView1<u8>) -> u8 {
    scratch.clear();
    scratch.extend(lane.iter().copied());

    let len = scratch.len();
    let (lower, upper, _) = scratch.select_nth_unstable(len / 2);
    let upper = *upper;
    if len % 2 == 1 {
        return upper;
    }

    // Even count: the other middle sample is the largest one below `mid`
    let lower = lower.iter().copied().max().unwrap_or(upper);
    ((lower as u16 + upper as u16) / 2) as u8
}
