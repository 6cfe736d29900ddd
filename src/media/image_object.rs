use super::{Frame, MediaObject};
use crate::surface::Surface;
use image::RgbaImage;
use std::sync::Arc;

/// A media object backed by a decoded RGBA raster
#[derive(Debug, Clone)]
pub struct ImageObject {
    frame: Frame,
    source: Arc<RgbaImage>,
}

impl ImageObject {
    pub fn new(x: f32, y: f32, width: f32, height: f32, source: Arc<RgbaImage>) -> Self {
        Self {
            frame: Frame::new(x, y, width, height),
            source,
        }
    }

    /// Place an image at (x, y) at its natural size
    pub fn at_natural_size(x: f32, y: f32, source: RgbaImage) -> Self {
        let (width, height) = source.dimensions();
        Self::new(x, y, width as f32, height as f32, Arc::new(source))
    }

    pub fn source(&self) -> &Arc<RgbaImage> {
        &self.source
    }
}

impl MediaObject for ImageObject {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn draw(&self, surface: Option<&mut Surface>, at: Option<(f32, f32)>) {
        let Some(surface) = surface else {
            tracing::trace!("ImageObject::draw called without a surface");
            return;
        };
        let (x, y) = at.unwrap_or((self.frame.x(), self.frame.y()));
        surface.draw_image(&self.source, x, y, self.frame.width(), self.frame.height());
    }
}
