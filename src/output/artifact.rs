use crate::error::Result;
use crate::media::ImageObject;
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// A standalone PNG produced by the cutout extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl ImageArtifact {
    /// Encode an RGBA raster as PNG
    pub fn encode(image: &RgbaImage) -> Result<Self> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let (width, height) = image.dimensions();
        Ok(Self { width, height, png })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&self.png)
        )
    }

    pub fn decode(&self) -> Result<RgbaImage> {
        Ok(image::load_from_memory_with_format(&self.png, ImageFormat::Png)?.to_rgba8())
    }

    /// Build a new, independent media object from the artifact, placed at
    /// (x, y) at its natural size
    pub fn into_media_object(&self, x: f32, y: f32) -> Result<ImageObject> {
        Ok(ImageObject::at_natural_size(x, y, self.decode()?))
    }
}
