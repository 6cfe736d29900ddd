mod frame;
mod image_object;

pub use frame::{Corner, Frame, Handle, ResizeCursor, HANDLE_SIZE, MIN_FRAME_SIZE};
pub use image_object::ImageObject;

use crate::surface::Surface;

/// Trait for anything that can be positioned and resized on the canvas.
/// Shared geometry and the selection chrome live on [`Frame`]; variants only
/// decide how their content is painted.
pub trait MediaObject {
    fn frame(&self) -> &Frame;

    fn frame_mut(&mut self) -> &mut Frame;

    /// Paint the content at `at`, or at the frame's own position.
    ///
    /// A missing surface is tolerated and simply draws nothing.
    fn draw(&self, surface: Option<&mut Surface>, at: Option<(f32, f32)>);
}

/// Render a media object into a fresh off-screen surface sized exactly to
/// its own geometry, independent of any on-screen zoom or pan
pub fn rasterize(media: &dyn MediaObject) -> Surface {
    let (width, height) = media.frame().pixel_size();
    let _span = tracing::debug_span!("rasterize", width, height).entered();

    let mut surface = Surface::new(width, height);
    media.draw(Some(&mut surface), Some((0.0, 0.0)));
    surface
}
