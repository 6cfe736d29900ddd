// Cutout extraction: keeps the selected pixels of a media object and makes
// everything else fully transparent.

use super::ImageArtifact;
use crate::error::{Result, StickerError};
use crate::media::{rasterize, MediaObject};
use crate::segmentation::{is_foreground, CategoryMask};
use image::{imageops, RgbaImage};
use std::borrow::Cow;

/// What to do when the mask was computed at a different size than the
/// object is now rendered at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Fail with `DimensionMismatch`
    #[default]
    Reject,
    /// Nearest-neighbour resample the mask to the object's size first
    Resample,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    pub on_mismatch: MismatchPolicy,
    /// Crop the result to the bounding box of the selection
    pub trim: bool,
}

/// Cut the masked region out of `media` into a new transparent-background
/// PNG
pub fn extract(
    media: &dyn MediaObject,
    mask: Option<&CategoryMask>,
    options: &ExtractOptions,
) -> Result<ImageArtifact> {
    let mask = mask.ok_or(StickerError::NoMaskAvailable)?;
    let _span = tracing::debug_span!("extract").entered();

    let mut raster = rasterize(media).into_image();
    let dimensions = raster.dimensions();

    let mask = if mask.dimensions() == dimensions {
        Cow::Borrowed(mask)
    } else {
        match options.on_mismatch {
            MismatchPolicy::Reject => {
                return Err(StickerError::DimensionMismatch {
                    expected: dimensions,
                    actual: mask.dimensions(),
                });
            }
            MismatchPolicy::Resample => {
                tracing::debug!(
                    "Resampling {}x{} mask to {}x{}",
                    mask.width(),
                    mask.height(),
                    dimensions.0,
                    dimensions.1
                );
                Cow::Owned(mask.resample(dimensions.0, dimensions.1)?)
            }
        }
    };

    apply_mask_alpha(&mut raster, &mask)?;

    if options.trim {
        let (x0, y0, x1, y1) = mask
            .selection_bounds()
            .ok_or(StickerError::NoMaskAvailable)?;
        raster = imageops::crop_imm(&raster, x0, y0, x1 - x0, y1 - y0).to_image();
    }

    tracing::info!(
        "Extracted {}x{} cutout ({} pixels kept)",
        raster.width(),
        raster.height(),
        mask.selected_count()
    );
    ImageArtifact::encode(&raster)
}

/// Zero the alpha of every background pixel; colour channels are untouched.
/// Mask and raster must share the same size and row-major layout.
pub fn apply_mask_alpha(raster: &mut RgbaImage, mask: &CategoryMask) -> Result<()> {
    if raster.dimensions() != mask.dimensions() {
        return Err(StickerError::DimensionMismatch {
            expected: raster.dimensions(),
            actual: mask.dimensions(),
        });
    }

    for (pixel, score) in raster.pixels_mut().zip(mask.scores()) {
        if !is_foreground(*score) {
            pixel[3] = 0;
        }
    }
    Ok(())
}
