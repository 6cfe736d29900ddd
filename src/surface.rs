// Off-screen RGBA drawing target
// Everything the pipeline paints (media content, borders, overlays, cutouts)
// lands in one of these.

use image::{imageops, Pixel, Rgba, RgbaImage};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A 2D raster surface with canvas-like fill/stroke/draw-image primitives.
///
/// Coordinates are f32 pixels; shapes are rounded to whole pixels and clipped
/// to the surface bounds, so drawing partially (or fully) off-surface is fine.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Resize the surface; like a canvas, this discards all content
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    /// Clear every pixel to fully transparent
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Overwrite a single pixel; out-of-bounds writes are dropped
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if let Some(pixel) = self.pixels.get_pixel_mut_checked(x, y) {
            *pixel = color;
        }
    }

    /// Fill an axis-aligned rectangle
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let (x0, x1) = self.clip_span(x, x + width, self.width());
        let (y0, y1) = self.clip_span(y, y + height, self.height());

        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.get_pixel_mut(px, py).blend(&color);
            }
        }
    }

    /// Stroke a rectangle outline centred on its path, the way a 2D canvas
    /// `strokeRect` does (half the line inside, half outside)
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        color: Rgba<u8>,
    ) {
        let half = line_width / 2.0;
        // Top and bottom span the full outer width; sides fill the gap so
        // translucent colours are not blended twice at the corners.
        self.fill_rect(x - half, y - half, width + line_width, line_width, color);
        self.fill_rect(x - half, y + height - half, width + line_width, line_width, color);
        self.fill_rect(x - half, y + half, line_width, height - line_width, color);
        self.fill_rect(x + width - half, y + half, line_width, height - line_width, color);
    }

    /// Paint `source` scaled to `width` x `height` with its top-left at (x, y)
    pub fn draw_image(&mut self, source: &RgbaImage, x: f32, y: f32, width: f32, height: f32) {
        let target_width = width.round().max(0.0) as u32;
        let target_height = height.round().max(0.0) as u32;
        if target_width == 0 || target_height == 0 || source.width() == 0 || source.height() == 0 {
            return;
        }

        let _span = tracing::trace_span!("draw_image", target_width, target_height).entered();

        let (left, top) = (x.round() as i64, y.round() as i64);
        if source.dimensions() == (target_width, target_height) {
            self.composite(source, left, top);
        } else {
            let scaled = imageops::resize(
                source,
                target_width,
                target_height,
                imageops::FilterType::Triangle,
            );
            self.composite(&scaled, left, top);
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn as_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Source-over composite with the top-left of `source` at (left, top).
    /// Pixels landing on fully transparent destination are copied as-is, so
    /// colour stored under zero alpha survives rasterization.
    fn composite(&mut self, source: &RgbaImage, left: i64, top: i64) {
        let (width, height) = (i64::from(self.width()), i64::from(self.height()));
        for (sx, sy, src) in source.enumerate_pixels() {
            let (dx, dy) = (left + i64::from(sx), top + i64::from(sy));
            if dx < 0 || dy < 0 || dx >= width || dy >= height {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(dx as u32, dy as u32);
            if dst[3] == 0 {
                *dst = *src;
            } else {
                dst.blend(src);
            }
        }
    }

    fn clip_span(&self, start: f32, end: f32, limit: u32) -> (u32, u32) {
        let lo = start.round().clamp(0.0, limit as f32) as u32;
        let hi = end.round().clamp(0.0, limit as f32) as u32;
        (lo, hi.max(lo))
    }
}
