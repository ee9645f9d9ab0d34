//! Invisibility cloak for live video.
//!
//! The [`cloak::Compositor`] learns a static background from the first frames
//! of a session and afterwards replaces every pixel of the cloak color with
//! that background. [`capture`] and [`output`] connect it to a webcam and a
//! v4l2loopback device.

pub mod capture;
pub mod cloak;
pub mod config;
pub mod error;
pub mod output;

pub use error::{CloakError, Result};
