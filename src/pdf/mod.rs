//! # PDF Serializer
//!
//! Writes laid-out report pages as a PDF 1.7 file.
//!
//! This is a from-scratch writer: the subset of PDF the reports need (two
//! standard fonts, rectangles, lines, text and image XObjects) is small
//! enough to emit directly.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Pages are written as they arrive. A page's images become XObjects
//! immediately, so the decoded pixels can be dropped as soon as
//! [`RenderBackend::add_page`] returns. Only the compressed objects stay in
//! memory until [`RenderBackend::finish`].
//!
//! Text uses the standard Type1 fonts with WinAnsiEncoding, which covers
//! the Latin-1 repertoire Portuguese needs.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use chrono::{DateTime, Utc};
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::backend::RenderBackend;
use crate::error::ReportError;
use crate::font::StandardFont;
use crate::image_loader::{ImagePixelData, JpegColorSpace, ResolvedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, PhotoSlot};

/// Object id of the first font; fonts follow in [`StandardFont::ALL`] order.
const FIRST_FONT_ID: usize = 3;

struct PdfObject {
    data: Vec<u8>,
}

/// Incremental PDF backend.
pub struct PdfWriter {
    /// Index 0 is the free-list head; ids equal indices.
    objects: Vec<PdfObject>,
    page_obj_ids: Vec<usize>,
    /// Image XObjects written so far, named /Im0, /Im1, ...
    image_count: usize,
    title: Option<String>,
    creation_date: Option<DateTime<Utc>>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut objects = Vec::new();
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog, 2 = Pages, 3.. = fonts
        for _ in 0..FIRST_FONT_ID {
            objects.push(PdfObject { data: Vec::new() });
        }
        for font in StandardFont::ALL {
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            });
        }

        PdfWriter {
            objects,
            page_obj_ids: Vec::new(),
            image_count: 0,
            title: None,
            creation_date: None,
        }
    }

    /// Document title for the Info dictionary.
    pub fn with_title(mut self, title: &str) -> Self {
        if !title.trim().is_empty() {
            self.title = Some(title.to_string());
        }
        self
    }

    pub fn with_creation_date(mut self, at: DateTime<Utc>) -> Self {
        self.creation_date = Some(at);
        self
    }

    fn push_object(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_entries: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< {} /Length {} >>\nstream\n",
            dict_entries,
            payload.len()
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push_object(data)
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(&mut self, image: &ResolvedImage) -> usize {
        let (w, h) = (image.natural_width, image.natural_height);
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                    JpegColorSpace::DeviceCMYK => "/DeviceCMYK",
                };
                // Adobe writes CMYK JPEGs inverted
                let decode = if *color_space == JpegColorSpace::DeviceCMYK {
                    " /Decode [1 0 1 0 1 0 1 0]"
                } else {
                    ""
                };
                self.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace {} /BitsPerComponent 8{} /Filter /DCTDecode",
                        w, h, color_space_str, decode
                    ),
                    data,
                )
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // Write SMask first if alpha channel exists
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let id = self.push_stream(
                            &format!(
                                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                                 /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                                w, h
                            ),
                            &compress_to_vec_zlib(alpha_data, 6),
                        );
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                self.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                        w, h, smask_ref
                    ),
                    &compress_to_vec_zlib(rgb, 6),
                )
            }
        }
    }

    /// Write a single layout element (and its children) as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        image_names: &[Option<usize>],
    ) {
        match &element.draw {
            DrawCommand::None => {}

            DrawCommand::Rect {
                fill,
                stroke,
                line_width,
            } => {
                let y = page_height - element.y - element.height;
                let op = match (fill, stroke) {
                    (Some(_), Some(_)) => "B",
                    (Some(_), None) => "f",
                    (None, Some(_)) => "S",
                    (None, None) => "n",
                };
                let _ = writeln!(stream, "q");
                if let Some(c) = fill {
                    let _ = writeln!(stream, "{:.3} {:.3} {:.3} rg", c.r, c.g, c.b);
                }
                if let Some(c) = stroke {
                    let _ = writeln!(stream, "{:.3} {:.3} {:.3} RG\n{:.2} w", c.r, c.g, c.b, line_width);
                }
                let _ = writeln!(
                    stream,
                    "{:.2} {:.2} {:.2} {:.2} re\n{}\nQ",
                    element.x, y, element.width, element.height, op
                );
            }

            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                line_width,
            } => {
                let _ = writeln!(
                    stream,
                    "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ",
                    color.r,
                    color.g,
                    color.b,
                    line_width,
                    x1,
                    page_height - y1,
                    x2,
                    page_height - y2
                );
            }

            DrawCommand::Text {
                lines,
                font,
                font_size,
                color,
            } => {
                let _ = writeln!(stream, "BT\n{:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
                let _ = writeln!(stream, "/F{} {:.1} Tf", font.resource_index(), font_size);
                for line in lines {
                    // Tm rather than Td: positions are absolute
                    let _ = writeln!(
                        stream,
                        "1 0 0 1 {:.2} {:.2} Tm\n({}) Tj",
                        line.x,
                        page_height - line.y,
                        encode_winansi(&line.text)
                    );
                }
                let _ = writeln!(stream, "ET");
            }

            DrawCommand::Image { slot } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                match image_names.get(*slot).copied().flatten() {
                    Some(idx) => {
                        let _ = writeln!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ",
                            element.width, element.height, x, y, idx
                        );
                    }
                    None => {
                        // Fallback: grey box if the slot has no image
                        let _ = writeln!(
                            stream,
                            "q\n0.9 0.9 0.9 rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ",
                            x, y, element.width, element.height
                        );
                    }
                }
            }
        }

        for child in &element.children {
            self.write_element(stream, child, page_height, image_names);
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; self.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in self.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", self.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", self.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl RenderBackend for PdfWriter {
    type Output = Vec<u8>;

    fn add_page(&mut self, page: &LayoutPage, slots: &[PhotoSlot<'_>]) -> Result<(), ReportError> {
        // Register only the images this page actually draws
        let mut used = vec![false; slots.len()];
        mark_used_slots(&page.elements, &mut used);

        let mut image_names: Vec<Option<usize>> = vec![None; slots.len()];
        let mut xobjects = Vec::new();
        for (i, slot) in slots.iter().enumerate() {
            if let (true, Some(image)) = (used[i], slot.image.as_ref()) {
                let id = self.write_image_xobject(image);
                image_names[i] = Some(self.image_count);
                xobjects.push(format!("/Im{} {} 0 R", self.image_count, id));
                self.image_count += 1;
            }
        }

        let mut content = String::new();
        for element in &page.elements {
            self.write_element(&mut content, element, page.height, &image_names);
        }
        let content_obj_id = self.push_stream(
            "/Filter /FlateDecode",
            &compress_to_vec_zlib(content.as_bytes(), 6),
        );

        let fonts: String = StandardFont::ALL
            .iter()
            .map(|f| format!("/F{} {} 0 R", f.resource_index(), FIRST_FONT_ID + f.resource_index()))
            .collect::<Vec<_>>()
            .join(" ");
        let resources = if xobjects.is_empty() {
            format!("/Font << {} >>", fonts)
        } else {
            format!("/Font << {} >> /XObject << {} >>", fonts, xobjects.join(" "))
        };
        let page_obj_id = self.push_object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            )
            .into_bytes(),
        );
        self.page_obj_ids.push(page_obj_id);
        log::debug!(
            "pdf: page {} written with {} image(s)",
            self.page_obj_ids.len(),
            xobjects.len()
        );
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ReportError> {
        if self.page_obj_ids.is_empty() {
            return Err(ReportError::RenderError("document has no pages".to_string()));
        }

        self.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = self
            .page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.page_obj_ids.len()
        )
        .into_bytes();

        // Info dictionary (metadata)
        let mut info = String::from("<< ");
        if let Some(ref title) = self.title {
            let _ = write!(info, "/Title {} ", pdf_text_string(title));
        }
        if let Some(at) = self.creation_date {
            let _ = write!(info, "/CreationDate ({}) ", at.format("D:%Y%m%d%H%M%SZ"));
        }
        let _ = write!(info, "/Producer (photoreport {}) >>", env!("CARGO_PKG_VERSION"));
        let info_obj_id = self.push_object(info.into_bytes());

        Ok(self.serialize(Some(info_obj_id)))
    }
}

fn mark_used_slots(elements: &[LayoutElement], used: &mut [bool]) {
    for element in elements {
        if let DrawCommand::Image { slot } = element.draw {
            if let Some(flag) = used.get_mut(slot) {
                *flag = true;
            }
        }
        mark_used_slots(&element.children, used);
    }
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Encode text for a WinAnsi string literal. Characters outside the
/// encoding become `?`; bytes outside printable ASCII are octal-escaped.
fn encode_winansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in escape_pdf_string(text).chars() {
        match unicode_to_winansi(ch) {
            Some(b) if (0x20..=0x7E).contains(&b) => out.push(b as char),
            Some(b) => {
                let _ = write!(out, "\\{:03o}", b);
            }
            None => out.push('?'),
        }
    }
    out
}

/// A PDF text string in UTF-16BE with a byte order mark, as hex.
fn pdf_text_string(s: &str) -> String {
    let mut out = String::from("<FEFF");
    for unit in s.encode_utf16() {
        let _ = write!(out, "{:04X}", unit);
    }
    out.push('>');
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    // ASCII printable range maps directly
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    // Windows-1252 special mappings (0x80-0x9F)
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}
