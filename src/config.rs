//! # Layout Configuration
//!
//! Page geometry, typography and user-visible labels. Everything is in PDF
//! points (1/72 inch). The defaults describe a portrait A4 sheet with the
//! measurements the reports have always used, expressed in millimetres and
//! converted with [`MM`].

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// One millimetre in points.
pub const MM: f64 = 72.0 / 25.4;

/// Fixed geometry and typography for every generated page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_width: f64,
    pub page_height: f64,
    /// Distance from the page edge to the content area. The decorative
    /// frame sits halfway between the edge and the content.
    pub margin: f64,
    /// Horizontal gap between grid columns.
    pub gap: f64,
    /// Height of every image box in the photo grid.
    pub target_row_height: f64,
    /// Vertical space below each grid row reserved for captions.
    pub caption_reserved_height: f64,
    /// Distance from the bottom of an image box to the first caption baseline.
    pub caption_offset: f64,
    pub caption_line_height: f64,
    /// Total horizontal inset applied to the box width when wrapping captions.
    pub caption_inset: f64,

    // Cover sheet
    pub cover_title_baseline: f64,
    pub table_top: f64,
    pub table_label_width: f64,
    pub table_row_height: f64,
    pub table_line_height: f64,
    /// Extra offset of the CREA value after its label inside the half cell.
    pub crea_value_offset: f64,
    pub description_min_height: f64,
    pub description_line_height: f64,
    /// Distance from the bottom edge to the timestamp baseline.
    pub timestamp_bottom: f64,

    // Content pages
    pub title_offset: f64,
    pub title_rule_above: f64,
    pub title_rule_below: f64,
    pub title_advance: f64,
    pub content_inset: f64,
    pub content_line_height: f64,
    pub content_spacing: f64,
    /// Distance from the bottom edge to the page-number baseline.
    pub page_number_bottom: f64,

    // Typography
    pub cover_title_size: f64,
    pub table_font_size: f64,
    pub body_font_size: f64,
    pub page_title_size: f64,
    pub caption_font_size: f64,
    pub footer_font_size: f64,

    // Strokes
    pub frame_line_width: f64,
    pub table_line_width: f64,
    pub box_line_width: f64,

    // Resource limits
    /// Largest file an image source may read, in bytes.
    pub max_source_bytes: u64,
    /// Largest allocation a single image decode may make, in bytes.
    pub max_decode_alloc: u64,

    pub labels: Labels,
}

/// Every user-visible string the engine prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    pub cover_title: String,
    pub client: String,
    pub number: String,
    pub address: String,
    pub subject: String,
    pub engineer: String,
    pub crea: String,
    pub figure: String,
    pub page: String,
    pub untitled: String,
    pub image_unavailable: String,
    pub generated_at: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            cover_title: "RELATÓRIO FOTOGRÁFICO".to_string(),
            client: "Cliente".to_string(),
            number: "Nota Técnica".to_string(),
            address: "Endereço".to_string(),
            subject: "Assunto".to_string(),
            engineer: "Engenheiro".to_string(),
            crea: "CREA".to_string(),
            figure: "Figura".to_string(),
            page: "Página".to_string(),
            untitled: "Sem título".to_string(),
            image_unavailable: "Imagem não disponível".to_string(),
            generated_at: "Gerado em:".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 18.0 * MM,
            gap: 8.0 * MM,
            target_row_height: 70.0 * MM,
            caption_reserved_height: 18.0 * MM,
            caption_offset: 6.0 * MM,
            caption_line_height: 5.0 * MM,
            caption_inset: 6.0 * MM,

            cover_title_baseline: 35.0 * MM,
            table_top: 50.0 * MM,
            table_label_width: 40.0 * MM,
            table_row_height: 12.0 * MM,
            table_line_height: 5.0 * MM,
            crea_value_offset: 17.0 * MM,
            description_min_height: 24.0 * MM,
            description_line_height: 6.0 * MM,
            timestamp_bottom: 12.0 * MM,

            title_offset: 8.0 * MM,
            title_rule_above: 6.0 * MM,
            title_rule_below: 4.0 * MM,
            title_advance: 7.0 * MM,
            content_inset: 10.0 * MM,
            content_line_height: 5.0 * MM,
            content_spacing: 12.0 * MM,
            page_number_bottom: 10.0 * MM,

            cover_title_size: 20.0,
            table_font_size: 11.0,
            body_font_size: 10.0,
            page_title_size: 14.0,
            caption_font_size: 9.0,
            footer_font_size: 9.0,

            frame_line_width: 0.5 * MM,
            table_line_width: 0.3 * MM,
            box_line_width: 0.2 * MM,

            max_source_bytes: 32 * 1024 * 1024,
            max_decode_alloc: 512 * 1024 * 1024,

            labels: Labels::default(),
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) configuration. Missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        serde_json::from_str(json).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// Width of the content area between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Bottom edge of the content area.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_a4_ratios() {
        let c = LayoutConfig::default();
        // 210 x 297 mm
        assert!((c.page_width / MM - 210.0).abs() < 0.01);
        assert!((c.page_height / MM - 297.0).abs() < 0.01);
        assert!((c.margin / MM - 18.0).abs() < 1e-9);
        assert!((c.content_width() / MM - 174.0).abs() < 0.01);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c = LayoutConfig::from_json(r#"{"gap": 10, "labels": {"figure": "Figure"}}"#).unwrap();
        assert_eq!(c.gap, 10.0);
        assert_eq!(c.labels.figure, "Figure");
        assert_eq!(c.labels.page, "Página");
        assert!((c.margin - 18.0 * MM).abs() < 1e-9);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = LayoutConfig::from_json("{\"gap\": \"wide\"}").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
