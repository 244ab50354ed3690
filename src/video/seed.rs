//! Seed images and data-URL decoding.

use crate::error::{Result, StillMotionError};
use base64::Engine;
use std::path::Path;

/// MIME type used when a data URL carries no recognizable `type/subtype;` header.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Image formats recognized from file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// The still image a video is generated from.
///
/// Holds the payload in base64 form, which is what the service expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedImage {
    /// MIME type (e.g., "image/png").
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub base64_payload: String,
}

impl SeedImage {
    /// Creates a seed image from an already-encoded payload.
    pub fn new(mime_type: impl Into<String>, base64_payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_payload: base64_payload.into(),
        }
    }

    /// Splits a data URL (`data:<mime>;base64,<payload>`) into MIME type and payload.
    ///
    /// The MIME type is whatever sits between the first `:` and the next `;` of
    /// the header; without that pattern it falls back to [`OCTET_STREAM`]. The
    /// payload is everything after the first comma, or the whole input when
    /// there is no comma (a bare base64 string).
    pub fn from_data_url(data_url: &str) -> Self {
        let (header, payload) = match data_url.split_once(',') {
            Some((header, payload)) => (header, payload),
            None => ("", data_url),
        };

        let mime_type = header
            .split_once(':')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(mime, _)| mime.trim())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(OCTET_STREAM);

        Self::new(mime_type, payload)
    }

    /// Encodes raw image bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Reads an image file, detecting its MIME type from contents, then extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = ImageFormat::from_magic_bytes(&bytes).or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let mime_type = format.map(|f| f.mime_type()).unwrap_or(OCTET_STREAM);
        Ok(Self::from_bytes(&bytes, mime_type))
    }

    /// Decodes the payload back into raw bytes.
    ///
    /// Tolerates embedded whitespace and missing padding.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let cleaned: String = self
            .base64_payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
            return Ok(data);
        }
        base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(&cleaned)
            .map_err(|e| StillMotionError::Decode(format!("seed image payload: {e}")))
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload)
    }
}
