//! Image payload preparation
//!
//! Turns an image file into the single encoding the analysis service
//! accepts: 896x869 pixels, JPEG at quality 80, base64 text. This is the
//! CLI's image collaborator; the session only ever sees the finished
//! [`ImagePayload`].

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Result, ScanChatError};
use crate::session::ImagePayload;

/// Width of every encoded image
pub const TARGET_WIDTH: u32 = 896;
/// Height of every encoded image
pub const TARGET_HEIGHT: u32 = 869;
/// JPEG quality (0-100)
pub const JPEG_QUALITY: u8 = 80;

/// Load, resize and encode an image file
///
/// # Errors
///
/// Returns [`ScanChatError::Payload`] if the file cannot be read or
/// decoded.
pub fn encode_image_file(path: &Path) -> Result<ImagePayload> {
    let image = image::open(path).map_err(|e| {
        ScanChatError::Payload(format!("Failed to open image {}: {}", path.display(), e))
    })?;
    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    encode_image(&image)
}

/// Resize to the target dimensions and encode as base64 JPEG
///
/// # Errors
///
/// Returns [`ScanChatError::Payload`] if JPEG encoding fails.
pub fn encode_image(image: &DynamicImage) -> Result<ImagePayload> {
    let resized = image
        .resize_exact(TARGET_WIDTH, TARGET_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(|e| ScanChatError::Payload(format!("Failed to encode JPEG: {}", e)))?;

    tracing::debug!("Encoded {} byte JPEG payload", jpeg.len());
    Ok(ImagePayload::from_base64(STANDARD.encode(&jpeg)))
}

/// Read a file that already holds base64 JPEG text
///
/// Surrounding whitespace is stripped and the text must be valid base64.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not base64.
pub fn load_base64_file(path: &Path) -> Result<ImagePayload> {
    let contents = std::fs::read_to_string(path).map_err(ScanChatError::Io)?;
    let encoded = contents.trim();
    if encoded.is_empty() {
        return Err(ScanChatError::Payload(format!("{} is empty", path.display())).into());
    }
    STANDARD.decode(encoded).map_err(|e| {
        ScanChatError::Payload(format!("{} is not valid base64: {}", path.display(), e))
    })?;
    Ok(ImagePayload::from_base64(encoded))
}

/// Load an image file, either raw or pre-encoded
pub fn load_payload(path: &Path, pre_encoded: bool) -> Result<ImagePayload> {
    if pre_encoded {
        load_base64_file(path)
    } else {
        encode_image_file(path)
    }
}
