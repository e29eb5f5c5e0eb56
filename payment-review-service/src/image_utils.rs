use crate::error::ReviewError;
use base64::{engine::general_purpose, Engine as _};
use image::{codecs::jpeg::JpegEncoder, ColorType, DynamicImage, RgbImage};

/// Byte budget the compressed image is squeezed under before the text-safe
/// encoding is applied.
pub const MAX_ENCODED_IMAGE_BYTES: usize = 800 * 1024;
pub const JPEG_START_QUALITY: u8 = 80;
pub const JPEG_MIN_QUALITY: u8 = 10;
pub const JPEG_QUALITY_STEP: u8 = 10;

/// Re-encodes arbitrary bitmap bytes as a JPEG under the byte budget and
/// returns the base64 form. Quality drops one step at a time until the
/// budget is met or the floor is reached; a floor-quality result that is
/// still over budget is returned as-is, not rejected.
pub fn compress_to_base64(raw: &[u8]) -> Result<String, ReviewError> {
    let bitmap =
        image::load_from_memory(raw).map_err(|error| ReviewError::Decode(error.to_string()))?;
    let rgb = bitmap.to_rgb8();

    let mut quality = JPEG_START_QUALITY;
    let mut encoded = encode_jpeg(&rgb, quality)?;
    while encoded.len() > MAX_ENCODED_IMAGE_BYTES && quality > JPEG_MIN_QUALITY {
        quality -= JPEG_QUALITY_STEP;
        encoded = encode_jpeg(&rgb, quality)?;
    }

    Ok(general_purpose::STANDARD.encode(encoded))
}

/// Inverse of [`compress_to_base64`].
pub fn decode_base64(encoded: &str) -> Result<DynamicImage, ReviewError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|error| ReviewError::Decode(error.to_string()))?;
    image::load_from_memory(&bytes).map_err(|error| ReviewError::Decode(error.to_string()))
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ReviewError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|error| ReviewError::Decode(error.to_string()))?;
    Ok(buffer)
}
