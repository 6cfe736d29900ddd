// Image loading
// Decodes files or raw bytes into RGBA rasters for image-backed media objects

use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs;
use std::path::Path;

/// Load an image file from disk as RGBA
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    let path = path.as_ref();
    let data = fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    decode_rgba(&data).with_context(|| format!("Failed to load {}", path.display()))
}

/// Decode raw bytes, auto-detecting the format
pub fn decode_rgba(data: &[u8]) -> Result<RgbaImage> {
    let format = image::guess_format(data).context("Failed to detect image format")?;
    let img = image::load_from_memory_with_format(data, format).context("Failed to decode image")?;

    tracing::debug!("Decoded {:?} image {}x{}", format, img.width(), img.height());
    Ok(img.to_rgba8())
}
