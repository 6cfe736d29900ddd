//! Interactive segmentation and sticker cutouts.
//!
//! A [`SegmentationSession`](segmentation::SegmentationSession) turns clicks
//! and scribbles on a [`MediaObject`](media::MediaObject) into queries for a
//! [`SegmentationEngine`](segmentation::SegmentationEngine), keeps the latest
//! category mask, draws it as a highlight overlay and cuts the selection out
//! into a new transparent-background image.

pub mod error;
pub mod loader;
pub mod media;
pub mod output;
pub mod segmentation;
pub mod surface;

pub use error::{Result, StickerError};
