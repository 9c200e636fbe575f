use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::ImageFormat;
use studio_contracts::images::{ImageResource, DEFAULT_IMAGE_MIME};

/// Reads a user-supplied image file. The media type is sniffed from the
/// content, then the extension; unknown files are sent as PNG.
pub fn load_image_file(path: &Path) -> Result<ImageResource> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("image file is empty: {}", path.display());
    }
    let mime = image::guess_format(&bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok())
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_IMAGE_MIME);
    Ok(ImageResource::from_bytes(mime, &bytes))
}
