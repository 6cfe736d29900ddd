use thiserror::Error;

/// Errors reported by the segmentation and cutout pipeline.
///
/// Every variant is recoverable; the caller decides whether to prompt the
/// user, retry on a fresh action, or surface the message.
#[derive(Error, Debug)]
pub enum StickerError {
    /// The engine has not finished initializing
    #[error("segmentation engine is not ready yet, try again shortly")]
    EngineNotReady,

    /// An operation needed a mask before one was computed
    #[error("no segmentation mask available, make a selection first")]
    NoMaskAvailable,

    /// A rendering target was not supplied
    #[error("no drawing surface attached")]
    NoDrawingSurface,

    /// Mask and pixel buffer sizes disagree
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A score buffer that cannot describe a mask: zero-sized, or with a
    /// score count other than `width * height`
    #[error("invalid category mask: {width}x{height} with {len} scores")]
    InvalidMask { width: u32, height: u32, len: usize },

    /// A query was requested with no click or scribble recorded
    #[error("no click or scribble recorded for this session")]
    EmptyQuery,

    /// The engine rejected the query or failed internally
    #[error("segmentation engine error: {0}")]
    Engine(String),

    /// Encoding or decoding the cutout image failed
    #[error("image encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, StickerError>;
