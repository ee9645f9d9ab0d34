use super::background::BackgroundAccumulator;
use super::color::{bgr_to_hsv, in_range};
use super::composite::composite;
use super::morphology::refine_mask;
use super::types::{BgrImage, ColorRange, Mask};
use crate::error::{CloakError, Result};

/// Priming frames collected before the background is fixed
pub const DEFAULT_FRAMES_NEEDED: usize = 40;

/// Which half of the session the compositor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Collecting frames for the background estimate; frames pass through
    Learning,
    /// Background fixed; every frame is segmented and composited
    Active,
}

enum PipelineState {
    Learning(BackgroundAccumulator),
    Active { background: BgrImage },
}

/// Per-session cloak pipeline.
///
/// The first `frames_needed` frames are passed through untouched while they
/// are stacked into a median background. Every frame after that has its
/// cloak-colored pixels replaced by the background. There is no way back to
/// learning; start a new `Compositor` for a new session.
pub struct Compositor {
    color_range: ColorRange,
    frames_needed: usize,
    dimensions: Option<(u32, u32)>,
    state: PipelineState,
}

impl Compositor {
    pub fn new(color_range: ColorRange, frames_needed: usize) -> Result<Self> {
        if frames_needed == 0 {
            return Err(CloakError::Configuration(
                "frames_needed must be at least 1".to_string(),
            ));
        }

        tracing::debug!(
            "Compositor created: range {:?}..={:?}, {} priming frames",
            color_range.lower(),
            color_range.upper(),
            frames_needed
        );

        Ok(Self {
            color_range,
            frames_needed,
            dimensions: None,
            state: PipelineState::Learning(BackgroundAccumulator::new(frames_needed)),
        })
    }

    /// Process one frame and return the frame to display.
    ///
    /// While learning the input comes back unchanged, including on the call
    /// that completes the background. A frame whose size differs from the
    /// session's first frame is rejected and leaves the compositor untouched.
    pub fn process(&mut self, frame: &BgrImage) -> Result<BgrImage> {
        self.verify_dimensions(frame)?;
        self.dimensions.get_or_insert(frame.dimensions());

        let accumulator = match &mut self.state {
            PipelineState::Active { background } => {
                return cloak_frame(frame, background, &self.color_range);
            }
            PipelineState::Learning(accumulator) => accumulator,
        };

        accumulator.push(frame)?;
        tracing::debug!(
            "Captured background frame {}/{}",
            accumulator.captured(),
            self.frames_needed
        );

        if accumulator.is_complete() {
            let accumulator = std::mem::replace(accumulator, BackgroundAccumulator::new(0));
            let background = accumulator.collapse()?;
            tracing::info!("Background captured from {} frames", self.frames_needed);
            self.state = PipelineState::Active { background };
        }

        Ok(frame.clone())
    }

    /// The refined cloak mask for `frame`, without touching session state
    pub fn refined_mask(&self, frame: &BgrImage) -> Result<Mask> {
        self.verify_dimensions(frame)?;
        Ok(refined_mask(frame, &self.color_range))
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            PipelineState::Learning(_) => Phase::Learning,
            PipelineState::Active { .. } => Phase::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == Phase::Active
    }

    /// Frames stacked so far; equals `frames_needed` once active
    pub fn frames_captured(&self) -> usize {
        match &self.state {
            PipelineState::Learning(accumulator) => accumulator.captured(),
            PipelineState::Active { .. } => self.frames_needed,
        }
    }

    pub fn frames_needed(&self) -> usize {
        self.frames_needed
    }

    pub fn color_range(&self) -> &ColorRange {
        &self.color_range
    }

    /// Session frame size, fixed by the first accepted frame
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// The median background, available once active
    pub fn background(&self) -> Option<&BgrImage> {
        match &self.state {
            PipelineState::Learning(_) => None,
            PipelineState::Active { background } => Some(background),
        }
    }

    fn verify_dimensions(&self, frame: &BgrImage) -> Result<()> {
        let (actual_width, actual_height) = frame.dimensions();
        match self.dimensions {
            Some((expected_width, expected_height))
                if (expected_width, expected_height) != (actual_width, actual_height) =>
            {
                Err(CloakError::DimensionMismatch {
                    expected_width,
                    expected_height,
                    actual_width,
                    actual_height,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Threshold `frame` in HSV against `range` and clean the result up
pub fn refined_mask(frame: &BgrImage, range: &ColorRange) -> Mask {
    refine_mask(&in_range(&bgr_to_hsv(frame), range))
}

/// Replace the cloak-colored parts of `live` with `background`
pub fn cloak_frame(live: &BgrImage, background: &BgrImage, range: &ColorRange) -> Result<BgrImage> {
    let mask = refined_mask(live, range);
    composite(live, background, &mask)
}
