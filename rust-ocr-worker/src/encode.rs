use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba};

use crate::error::EngineError;

/// Wraps raw RGBA bytes into an image buffer and encodes it to PNG in memory.
///
/// # Arguments
/// * `width` - Image width in pixels.
/// * `height` - Image height in pixels.
/// * `data` - Raw slice of RGBA pixel data, `width * height * 4` bytes.
pub fn encode_rgba_png(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>> {
    let buffer: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, data)
        .context("Failed to create image buffer from raw pixel data")?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    buffer
        .write_with_encoder(encoder)
        .context("Failed to encode in-memory PNG for OCR processing")?;

    Ok(png_data)
}

/// Decodes any image format the `image` crate understands and re-encodes it
/// as PNG, so the engine only ever receives one well-formed format.
pub fn normalize_to_png(bytes: &[u8]) -> Result<Vec<u8>, EngineError> {
    let decoded = image::load_from_memory(bytes).map_err(EngineError::InvalidImage)?;
    let rgba = decoded.to_rgba8();

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    rgba.write_with_encoder(encoder)
        .context("Failed to encode in-memory PNG for OCR processing")?;

    Ok(png_data)
}
