// Mask overlay: paints the selected region as a translucent highlight layer
// that sits over the working image without touching its pixels.

use crate::error::{Result, StickerError};
use crate::segmentation::CategoryMask;
use crate::surface::Surface;
use image::Rgba;

/// Colours and sizes used by [`OverlayRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Painted over every selected pixel
    pub highlight: Rgba<u8>,
    /// Side length of the last-input marker square
    pub marker_size: f32,
    pub marker_color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            highlight: Rgba([0, 128, 255, 128]),
            marker_size: 8.0,
            marker_color: Rgba([255, 64, 64, 255]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayRenderer {
    style: OverlayStyle,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// Resize `surface` to the mask, clear it, and paint the highlight on
    /// every selected pixel. Returns how many pixels were painted.
    pub fn render(&self, mask: Option<&CategoryMask>, surface: Option<&mut Surface>) -> Result<usize> {
        let mask = mask.ok_or(StickerError::NoMaskAvailable)?;
        let surface = surface.ok_or(StickerError::NoDrawingSurface)?;
        let _span = tracing::debug_span!("render_overlay").entered();

        let (width, height) = mask.dimensions();
        // Resizing a surface discards its content, leaving it transparent
        surface.resize(width, height);

        let mut painted = 0;
        for index in mask.selected_indices() {
            let (x, y) = mask.index_to_xy(index);
            surface.set_pixel(x, y, self.style.highlight);
            painted += 1;
        }

        tracing::debug!("Overlay highlighted {} of {} pixels", painted, mask.len());
        Ok(painted)
    }

    /// Mark the last input position with a small filled square centred on
    /// (x, y). Existing content is kept.
    pub fn render_input_marker(&self, surface: Option<&mut Surface>, x: f32, y: f32) -> Result<()> {
        let surface = surface.ok_or(StickerError::NoDrawingSurface)?;
        let size = self.style.marker_size;
        surface.fill_rect(x - size / 2.0, y - size / 2.0, size, size, self.style.marker_color);
        Ok(())
    }
}
