//! Image encoding: slide JPEGs on disk and data-URIs for the model API.
//!
//! Slides are saved as JPEG: PDFium renders RGBA, JPEG has no alpha channel,
//! so pixels are flattened to RGB first. The same bytes are later base64
//! wrapped into a `data:` URI because the endpoint never sees the filesystem.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// File name of the saved image for slide `index`: `slide_001.jpg`.
pub fn slide_file_name(index: usize) -> String {
    format!("slide_{index:03}.jpg")
}

/// Encode `img` as JPEG at `quality` (1–100) into memory.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}

/// Write `img` as a JPEG file at `path`, replacing any existing file.
pub fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), image::ImageError> {
    let bytes = encode_jpeg(img, quality)?;
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&bytes)?;
    out.flush()?;
    debug!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// MIME type inferred from an image file extension; JPEG when unknown.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Base64-encode raw bytes (standard alphabet, padded).
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Wrap raw image bytes into a `data:<mime>;base64,...` URI.
pub fn data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", to_base64(bytes))
}
