//! # Image Resolution and Decoding
//!
//! Turns a [`PhotoRef`] into a [`ResolvedImage`] with known pixel dimensions
//! and PDF-ready pixel data. JPEG images pass through without re-encoding
//! (PDF decodes DCT streams natively). PNG and WebP images are
//! decoded to RGB pixels with a separate alpha channel for SMask
//! transparency.
//!
//! Resolution is pluggable through [`ImageResolver`]. The default
//! [`SourceResolver`] understands data URIs, raw base64, local file paths
//! and `file://` URIs. Anything that needs a network belongs to a custom
//! resolver supplied by the caller.

use std::io::Cursor;

use thiserror::Error;

use crate::config::LayoutConfig;
use crate::model::{PhotoRef, PhotoSource};

/// A fully decoded/loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub pixel_data: ImagePixelData,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes. Embed directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
    DeviceCMYK,
}

/// Why a photo could not be turned into pixels.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("photo has no image source")]
    Missing,
    #[error("unsupported image source: {0}")]
    Unsupported(String),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("image source timed out: {0}")]
    Timeout(String),
    /// Decode buffers could not be allocated. Fatal for the page.
    #[error("not enough memory to decode image: {0}")]
    ResourceExhausted(String),
}

impl ImageError {
    /// Whether the photo can be replaced by a placeholder and rendering
    /// can continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ImageError::ResourceExhausted(_))
    }
}

/// Produces raster images for photos.
///
/// The engine calls `resolve` once per photo per render and never retries.
/// Every image it gets back is handed to `release` after the page using it
/// has been written, so resolvers that hold external handles (caches,
/// temporary files, pooled buffers) can free them deterministically.
pub trait ImageResolver {
    fn resolve(&self, photo: &PhotoRef) -> Result<ResolvedImage, ImageError>;

    fn release(&self, image: ResolvedImage) {
        drop(image);
    }
}

/// Default resolver for embedded data and local files.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    max_source_bytes: u64,
    max_decode_alloc: u64,
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl SourceResolver {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            max_source_bytes: config.max_source_bytes,
            max_decode_alloc: config.max_decode_alloc,
        }
    }

    /// Resolve the photo's source to raw image bytes.
    fn read_source_bytes(&self, source: PhotoSource<'_>) -> Result<Vec<u8>, ImageError> {
        match source {
            PhotoSource::Embedded(data) => {
                if data.starts_with("data:") {
                    decode_data_uri(data)
                } else {
                    base64_decode(data)
                }
            }
            PhotoSource::Locator(locator) => {
                if locator.starts_with("data:") {
                    return decode_data_uri(locator);
                }
                if let Some(path) = locator.strip_prefix("file://") {
                    return self.read_file(path);
                }
                // Base64 JPEG starts with "/9j/", which also looks like a path
                if looks_like_base64_image(locator) {
                    return base64_decode(locator);
                }
                if locator.starts_with('/') || locator.starts_with("./") || locator.starts_with("../") {
                    return self.read_file(locator);
                }
                if let Some((scheme, _)) = locator.split_once("://") {
                    return Err(ImageError::Unsupported(format!(
                        "'{}' URIs need a custom resolver",
                        scheme
                    )));
                }
                base64_decode(locator)
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read_file(&self, path: &str) -> Result<Vec<u8>, ImageError> {
        let meta = std::fs::metadata(path)
            .map_err(|e| ImageError::Decode(format!("Failed to read image file '{}': {}", path, e)))?;
        if meta.len() > self.max_source_bytes {
            return Err(ImageError::Decode(format!(
                "Image file '{}' is {} bytes, above the {} byte limit",
                path,
                meta.len(),
                self.max_source_bytes
            )));
        }
        std::fs::read(path)
            .map_err(|e| ImageError::Decode(format!("Failed to read image file '{}': {}", path, e)))
    }

    #[cfg(target_arch = "wasm32")]
    fn read_file(&self, path: &str) -> Result<Vec<u8>, ImageError> {
        Err(ImageError::Unsupported(format!(
            "File path images not supported in WASM: '{}'. Use data URIs or base64.",
            path
        )))
    }

    fn limits(&self) -> image::io::Limits {
        let mut limits = image::io::Limits::default();
        limits.max_alloc = Some(self.max_decode_alloc);
        limits
    }
}

impl ImageResolver for SourceResolver {
    fn resolve(&self, photo: &PhotoRef) -> Result<ResolvedImage, ImageError> {
        let source = photo.source().ok_or(ImageError::Missing)?;
        let raw_bytes = self.read_source_bytes(source)?;
        decode_image_bytes(&raw_bytes, self.limits())
    }
}

/// Decode image bytes with default limits.
pub fn decode_image(data: &[u8]) -> Result<ResolvedImage, ImageError> {
    decode_image_bytes(data, image::io::Limits::default())
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    // data:image/png;base64,iVBOR...
    let comma_pos = uri
        .find(',')
        .ok_or_else(|| ImageError::Decode("Invalid data URI: missing comma".to_string()))?;
    let header = &uri[..comma_pos];
    if !header.ends_with(";base64") {
        return Err(ImageError::Unsupported(
            "data URIs must be base64-encoded".to_string(),
        ));
    }
    base64_decode(&uri[comma_pos + 1..])
}

/// Base64 prefixes of the JPEG, PNG and RIFF (WebP) signatures.
fn looks_like_base64_image(s: &str) -> bool {
    ["/9j/", "iVBORw0KGgo", "UklGR"].iter().any(|p| s.starts_with(p))
}

fn base64_decode(input: &str) -> Result<Vec<u8>, ImageError> {
    use base64::Engine;
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ImageError::Decode(format!("Base64 decode error: {}", e)))
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8], limits: image::io::Limits) -> Result<ResolvedImage, ImageError> {
    if data.len() < 4 {
        return Err(ImageError::Decode("Image data too short".to_string()));
    }

    if is_jpeg(data) {
        decode_jpeg(data, limits)
    } else if is_png(data) || is_webp(data) {
        decode_to_rgb(data, limits)
    } else {
        Err(ImageError::Decode(
            "Unsupported image format (expected JPEG, PNG or WebP)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

fn map_image_error(e: image::ImageError) -> ImageError {
    match e {
        image::ImageError::Limits(limit)
            if matches!(limit.kind(), image::error::LimitErrorKind::InsufficientMemory) =>
        {
            ImageError::ResourceExhausted(limit.to_string())
        }
        other => ImageError::Decode(other.to_string()),
    }
}

fn reader_for(
    data: &[u8],
    limits: image::io::Limits,
) -> Result<image::io::Reader<Cursor<&[u8]>>, ImageError> {
    let mut reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(format!("Format detection error: {}", e)))?;
    reader.limits(limits);
    Ok(reader)
}

/// JPEG: decode once to prove the scan data is intact, then pass the raw
/// bytes through to the PDF (DCTDecode). The decoded pixels are dropped.
fn decode_jpeg(data: &[u8], limits: image::io::Limits) -> Result<ResolvedImage, ImageError> {
    if !has_end_of_image(data) {
        return Err(ImageError::Decode("JPEG is truncated (no EOI marker)".to_string()));
    }
    let decoded = reader_for(data, limits)?
        .decode()
        .map_err(map_image_error)?;
    let (width, height) = (decoded.width(), decoded.height());
    drop(decoded);

    if width == 0 || height == 0 {
        return Err(ImageError::Decode("JPEG has zero size".to_string()));
    }

    Ok(ResolvedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        natural_width: width,
        natural_height: height,
    })
}

/// Whether the stream ends with an EOI marker, ignoring trailing padding.
fn has_end_of_image(data: &[u8]) -> bool {
    let end = data
        .iter()
        .rposition(|&b| !matches!(b, 0x00 | b'\n' | b'\r' | b' '))
        .map_or(0, |i| i + 1);
    data[..end].ends_with(&[0xFF, 0xD9])
}

/// Scan JPEG markers to find the SOF (Start of Frame) segment and read
/// the number of components to determine color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            // SOF segment: length(2) + precision(1) + height(2) + width(2) + num_components(1)
            if i + 9 < data.len() {
                return match data[i + 9] {
                    1 => JpegColorSpace::DeviceGray,
                    4 => JpegColorSpace::DeviceCMYK,
                    _ => JpegColorSpace::DeviceRGB,
                };
            }
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG / WebP: decode to RGBA, split into RGB + alpha.
fn decode_to_rgb(data: &[u8], limits: image::io::Limits) -> Result<ResolvedImage, ImageError> {
    let img = reader_for(data, limits)?.decode().map_err(map_image_error)?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    if width == 0 || height == 0 {
        return Err(ImageError::Decode("Image has zero size".to_string()));
    }

    let pixel_count = width as usize * height as usize;
    let mut rgb: Vec<u8> = Vec::new();
    let mut alpha: Vec<u8> = Vec::new();
    rgb.try_reserve_exact(pixel_count * 3)
        .and_then(|_| alpha.try_reserve_exact(pixel_count))
        .map_err(|e| ImageError::ResourceExhausted(format!("{}x{} image: {}", width, height, e)))?;

    let mut has_transparency = false;
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        let a = pixel[3];
        alpha.push(a);
        if a != 255 {
            has_transparency = true;
        }
    }

    Ok(ResolvedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
        natural_width: width,
        natural_height: height,
    })
}
