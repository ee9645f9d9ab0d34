use thiserror::Error;

/// Errors raised by the cloak pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CloakError {
    /// Invalid color range or frame count at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A frame did not match the dimensions established by the first frame of the session.
    #[error("frame is {actual_width}x{actual_height}, session expects {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CloakError>;
