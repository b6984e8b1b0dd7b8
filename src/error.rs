//! Error type shared by every entry point
//!
//! Each variant maps to a stable integer status code so callers bridging to a
//! C-style API can report failures without matching on the enum.

use thiserror::Error;

/// Status code returned for success by [`status_of`].
pub const STATUS_OK: i32 = 0;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("no render context")]
    ContextMissing,

    #[error("coprocessor unavailable")]
    CoprocessorUnavailable,

    #[error("draw region missing or empty")]
    DrawRegionMissing,

    #[error("draw region unusable: {0}")]
    DrawRegionWrongKind(&'static str),

    #[error("z-buffering enabled but no depth buffer was supplied")]
    ZBufferMissing,

    #[error("degenerate primitive")]
    DegeneratePrimitive,

    #[error("out of memory")]
    OutOfMemory,

    #[error("failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("unsupported texture format: {0}")]
    TextureFormat(String),

    #[error("unsupported texture size {width}x{height}")]
    TextureSize { width: u32, height: u32 },

    #[error("texture limit of {0} reached")]
    TextureLimitReached(usize),

    #[error("unknown or destroyed texture handle")]
    UnknownTexture,

    #[error("invalid scissor: {0}")]
    InvalidScissor(&'static str),

    #[error("config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),
}

impl RasterError {
    /// Integer status code for this error (never [`STATUS_OK`])
    pub fn status_code(&self) -> i32 {
        match self {
            RasterError::ContextMissing => 1,
            RasterError::CoprocessorUnavailable => 2,
            RasterError::DrawRegionMissing => 3,
            RasterError::DrawRegionWrongKind(_) => 4,
            RasterError::ZBufferMissing => 5,
            RasterError::DegeneratePrimitive => 6,
            RasterError::OutOfMemory => 7,
            RasterError::FileRead(_) => 8,
            RasterError::TextureFormat(_) => 9,
            RasterError::TextureSize { .. } => 10,
            RasterError::TextureLimitReached(_) => 11,
            RasterError::UnknownTexture => 12,
            RasterError::InvalidScissor(_) => 13,
            RasterError::Config(_) => 14,
        }
    }
}

impl From<std::collections::TryReserveError> for RasterError {
    fn from(_: std::collections::TryReserveError) -> Self {
        RasterError::OutOfMemory
    }
}

impl From<image::ImageError> for RasterError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => RasterError::FileRead(io),
            other => RasterError::TextureFormat(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Collapse a result into its status code
pub fn status_of<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}
