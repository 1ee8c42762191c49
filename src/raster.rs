//! Content sniffing for raster images. Formats are detected from the bytes
//! themselves; filenames and declared content types are never consulted.

use crate::error::{MergeError, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{io::Reader, ImageFormat};
use std::fmt;
use std::io::Cursor;

/// The image formats that may be embedded into a pose file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
}

impl ImageKind {
    /// Map a decoder format onto the allowed set
    pub fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Gif => Some(ImageKind::Gif),
            ImageFormat::Bmp => Some(ImageKind::Bmp),
            ImageFormat::WebP => Some(ImageKind::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
            ImageKind::Bmp => "bmp",
            ImageKind::WebP => "webp",
        };
        f.write_str(name)
    }
}

/// Identify the format of `bytes` if they are a decodable image.
///
/// Only the magic bytes and the header are read, enough for the decoder to
/// report the dimensions. Pixel data is never decoded.
pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    let reader = Reader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let format = reader.format()?;
    reader.into_dimensions().ok()?;
    Some(format)
}

/// True if the decoder recognizes `bytes` as an image of any format
pub fn is_image(bytes: &[u8]) -> bool {
    sniff(bytes).is_some()
}

/// Image bytes that passed validation, tagged with their detected format
#[derive(Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    kind: ImageKind,
}

impl ImagePayload {
    /// Validate `bytes` as an image in one of the allowed formats
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let kind = sniff(&bytes)
            .and_then(ImageKind::from_format)
            .ok_or(MergeError::UnsupportedImage)?;
        Ok(ImagePayload { bytes, kind })
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard, padded base64 of the original bytes
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImagePayload {{ bytes: <{} bytes>, kind: {} }}",
            self.bytes.len(),
            self.kind
        )
    }
}
