//! # Font Management
//!
//! The engine draws exclusively with standard PDF fonts (Helvetica and
//! Helvetica-Bold), which every viewer ships and which need no embedding.
//! This module maps them to their PDF names and measures text with their
//! real advance widths.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use serde::Serialize;

/// The standard PDF faces used by report pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// Every face the engine can emit, in resource order (`/F0`, `/F1`).
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Index of this font in [`StandardFont::ALL`].
    pub fn resource_index(&self) -> usize {
        match self {
            Self::Helvetica => 0,
            Self::HelveticaBold => 1,
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA_METRICS,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD_METRICS,
        }
    }
}

/// Shared font context used by layout.
/// Provides text measurement with real glyph metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().measure_string(text, font_size)
    }
}
