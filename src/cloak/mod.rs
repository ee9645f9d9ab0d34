mod background;
mod color;
mod composite;
mod compositor;
mod morphology;
pub mod types;

pub use background::{median_background, BackgroundAccumulator};
pub use color::{bgr_to_hsv, in_range, pixel_to_hsv};
pub use composite::{composite, mask_to_frame};
pub use compositor::{cloak_frame, refined_mask, Compositor, Phase, DEFAULT_FRAMES_NEEDED};
pub use morphology::{dilate, erode, open, refine_mask, DILATE_ITERATIONS, OPEN_ITERATIONS};
pub use types::{BgrImage, ColorRange, HsvImage, Mask, BACKGROUND, CLOAK, HUE_LIMIT};
