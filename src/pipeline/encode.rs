//! Payload encoding: rendered pages and uploaded files → bare base64.
//!
//! The vision endpoints take bare base64 strings. Anything that might carry a
//! `data:<mime>;base64,` prefix goes through [`strip_data_uri`] before it is
//! put in a request body.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static DATA_URI_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^data:[^;,]+;base64,").unwrap());

/// A base64 image payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: &'static str,
    /// Bare base64, no data-URI prefix.
    pub base64: String,
}

/// Encode a rendered page as JPEG at `quality` (1–100).
///
/// Alpha is dropped first: JPEG has no alpha channel and pdfium renders RGBA.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<EncodedImage, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page → {} bytes JPEG, {} bytes base64",
        rgb.width(),
        rgb.height(),
        buf.len(),
        b64.len()
    );
    Ok(EncodedImage {
        mime: "image/jpeg",
        base64: b64,
    })
}

/// Bare base64 for a file, ready for a request body.
pub fn file_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Remove any data-URI prefix and all whitespace, including line breaks
/// inside a wrapped payload.
pub fn strip_data_uri(s: &str) -> String {
    let s = s.trim_start();
    let payload = match DATA_URI_PREFIX.find(s) {
        Some(prefix) => &s[prefix.end()..],
        None => s,
    };
    payload.chars().filter(|c| !c.is_whitespace()).collect()
}
