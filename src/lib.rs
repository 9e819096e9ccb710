//! # photoreport
//!
//! Pagination and layout engine for photographic inspection reports.
//!
//! A report is a cover sheet followed by one physical page per logical
//! page: a title, an optional block of free text and a grid of captioned
//! photos. Figure numbers run across the whole document, failed photos are
//! drawn as visible placeholders instead of disappearing, and the output is
//! fully determined by the input and [`LayoutConfig`].
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]         Report document: details, pages, photo refs
//!       ↓
//!   [assemble]      Page loop, figure counter, cancellation
//!       ↓        ↘
//!   [layout]        [image_loader]  Resolve photos, one page at a time
//!   (cover, content, grid, text)
//!       ↓
//!   [backend]       PdfWriter (bytes) or LayoutRecorder (LayoutInfo)
//! ```

pub mod assemble;
pub mod backend;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use assemble::{assemble, Assembler, CancelFlag};
pub use backend::{LayoutRecorder, RenderBackend};
pub use config::LayoutConfig;
pub use error::ReportError;
pub use image_loader::{ImageError, ImageResolver, ResolvedImage, SourceResolver};
pub use layout::LayoutInfo;
pub use model::{PhotoRef, ReportDocument, ReportPage};

/// Render a report to PDF bytes.
///
/// This is the primary entry point. Uses the default layout and resolves
/// photos from embedded data and local files.
pub fn render(document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    assemble(document)
}

/// Render a report described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, ReportError> {
    let document = parse_document(json)?;
    render(&document)
}

/// Lay out a report without painting it and return the structured layout
/// (positions, roles and text of every drawable).
pub fn render_layout(document: &ReportDocument) -> Result<LayoutInfo, ReportError> {
    Assembler::new(LayoutConfig::default()).run(document, LayoutRecorder::new())
}

/// Parse a report document from JSON.
pub fn parse_document(json: &str) -> Result<ReportDocument, ReportError> {
    Ok(serde_json::from_str(json)?)
}
