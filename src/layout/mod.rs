//! # Page Layout
//!
//! Turns report pages into positioned drawables on fixed-size sheets.
//!
//! There is no flowing canvas here: every physical page has a known size and
//! a known kind (cover or content), and the renderer places each element at
//! absolute coordinates computed from [`LayoutConfig`]. Coordinates use a
//! top-left origin with y growing downward, in points. The PDF writer flips
//! them when it serializes.
//!
//! The layout math is written once. Backends only see the finished
//! [`LayoutPage`] and decide how to paint it (see [`crate::backend`]).

pub mod content;
pub mod cover;
pub mod grid;

use serde::Serialize;

use crate::config::{LayoutConfig, MM};
use crate::font::{FontContext, StandardFont};
use crate::image_loader::ResolvedImage;
use crate::model::PhotoRef;
use crate::text::{centered_offset, TextLayout};

/// Helvetica ascender and descender in em units.
const ASCENT: f64 = 0.718;
const DESCENT: f64 = 0.207;

/// Horizontal padding between a cell border and its text.
const CELL_PADDING: f64 = 3.0 * MM;
/// Baseline of the first line of text in a table cell, from the cell top.
const CELL_BASELINE: f64 = 8.0 * MM;
/// Vertical padding added to boxed text on top of its line heights.
const BOX_PADDING: f64 = 6.0 * MM;

/// An RGB color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Color {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

/// An axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// What a drawable is for. Backends ignore it; the structured layout and
/// tests use it to find things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementRole {
    Frame,
    Title,
    Rule,
    DetailsRow,
    DescriptionBox,
    ContentBox,
    Figure,
    Placeholder,
    Caption,
    PageNumber,
    Timestamp,
}

/// Which of the two page states produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PageKind {
    Cover,
    /// `number` is the 1-based index among content pages.
    Content { number: usize },
}

/// A fully laid-out page ready for a backend.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub kind: PageKind,
    pub elements: Vec<LayoutElement>,
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
    pub role: ElementRole,
    /// Child elements (positioned relative to page, not parent).
    pub children: Vec<LayoutElement>,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Nothing to draw (just a grouping container).
    None,
    /// Fill and/or stroke the element's rectangle.
    Rect {
        fill: Option<Color>,
        stroke: Option<Color>,
        line_width: f64,
    },
    /// A straight stroke between two points.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        line_width: f64,
    },
    Text {
        lines: Vec<TextLine>,
        font: StandardFont,
        font_size: f64,
        color: Color,
    },
    /// Draw the resolved image of the page's photo slot `slot` into the
    /// element's rectangle.
    Image { slot: usize },
}

/// One line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub width: f64,
}

impl LayoutElement {
    /// An element that only groups its children.
    pub fn group(role: ElementRole, bounds: Rect, children: Vec<LayoutElement>) -> Self {
        LayoutElement {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            draw: DrawCommand::None,
            role,
            children,
        }
    }

    pub fn rect(role: ElementRole, bounds: Rect, fill: Option<Color>, stroke: Option<Color>, line_width: f64) -> Self {
        LayoutElement {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            draw: DrawCommand::Rect {
                fill,
                stroke,
                line_width,
            },
            role,
            children: Vec::new(),
        }
    }

    /// A horizontal rule from `x1` to `x2` at `y`.
    pub fn rule(x1: f64, x2: f64, y: f64, line_width: f64) -> Self {
        LayoutElement {
            x: x1,
            y,
            width: x2 - x1,
            height: 0.0,
            draw: DrawCommand::Line {
                x1,
                y1: y,
                x2,
                y2: y,
                color: Color::BLACK,
                line_width,
            },
            role: ElementRole::Rule,
            children: Vec::new(),
        }
    }

    /// A text element whose bounds enclose all of its lines.
    pub fn text(role: ElementRole, lines: Vec<TextLine>, font: StandardFont, font_size: f64, color: Color) -> Self {
        let left = lines.iter().map(|l| l.x).fold(f64::INFINITY, f64::min);
        let right = lines.iter().map(|l| l.x + l.width).fold(f64::NEG_INFINITY, f64::max);
        let top = lines.first().map(|l| l.y - ASCENT * font_size).unwrap_or(0.0);
        let bottom = lines.last().map(|l| l.y + DESCENT * font_size).unwrap_or(0.0);
        let (x, width) = if lines.is_empty() { (0.0, 0.0) } else { (left, right - left) };

        LayoutElement {
            x,
            y: top,
            width,
            height: bottom - top,
            draw: DrawCommand::Text {
                lines,
                font,
                font_size,
                color,
            },
            role,
            children: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Text drawn by this element alone, lines joined with spaces.
    pub fn text_content(&self) -> Option<String> {
        match &self.draw {
            DrawCommand::Text { lines, .. } if !lines.is_empty() => Some(
                lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => None,
        }
    }
}

/// A photo in render order together with its resolved image, if any.
#[derive(Debug)]
pub struct PhotoSlot<'a> {
    pub photo: &'a PhotoRef,
    /// `None` when the photo could not be resolved. Drawn as a placeholder.
    pub image: Option<ResolvedImage>,
}

impl<'a> PhotoSlot<'a> {
    pub fn resolved(photo: &'a PhotoRef, image: ResolvedImage) -> Self {
        PhotoSlot {
            photo,
            image: Some(image),
        }
    }

    pub fn unavailable(photo: &'a PhotoRef) -> Self {
        PhotoSlot { photo, image: None }
    }

    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.image
            .as_ref()
            .map(|img| (img.natural_width, img.natural_height))
    }
}

/// Document-wide figure numbering. Starts at 1 and only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureCounter {
    next: u32,
}

impl Default for FigureCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FigureCounter {
    pub fn new() -> Self {
        FigureCounter { next: 1 }
    }

    /// Take the current number and advance.
    pub fn next_number(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// The number the next figure will receive.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// How many numbers have been handed out.
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}

/// Lays out cover and content pages. See [`cover`] and [`content`] for the
/// two page states.
pub struct PageRenderer<'a> {
    config: &'a LayoutConfig,
    fonts: FontContext,
    text_layout: TextLayout,
}

impl<'a> PageRenderer<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        PageRenderer {
            config,
            fonts: FontContext::new(),
            text_layout: TextLayout::new(),
        }
    }

    /// The decorative border drawn on every page, halfway into the margin.
    fn frame(&self) -> LayoutElement {
        let c = self.config;
        let inset = c.margin / 2.0;
        LayoutElement::rect(
            ElementRole::Frame,
            Rect::new(inset, inset, c.page_width - c.margin, c.page_height - c.margin),
            None,
            Some(Color::BLACK),
            c.frame_line_width,
        )
    }

    fn wrap(&self, text: &str, max_width: f64, font: StandardFont, font_size: f64) -> Vec<String> {
        self.text_layout
            .wrap(&self.fonts, text, max_width, font, font_size)
    }

    fn measure(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        self.text_layout
            .measure_width(&self.fonts, text, font, font_size)
    }

    /// A single line starting at `x`.
    fn line_at(&self, text: &str, x: f64, baseline: f64, font: StandardFont, font_size: f64) -> TextLine {
        TextLine {
            x,
            y: baseline,
            text: text.to_string(),
            width: self.measure(text, font, font_size),
        }
    }

    /// Lines centred horizontally within `[left, left + width]`, spaced
    /// `line_height` apart from `first_baseline`.
    #[allow(clippy::too_many_arguments)]
    fn centered_lines(
        &self,
        lines: &[String],
        left: f64,
        width: f64,
        first_baseline: f64,
        line_height: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<TextLine> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let w = self.measure(text, font, font_size);
                TextLine {
                    x: left + centered_offset(w, width),
                    y: first_baseline + i as f64 * line_height,
                    text: text.clone(),
                    width: w,
                }
            })
            .collect()
    }

    /// Left-aligned lines from `x`, spaced `line_height` apart.
    fn left_lines(
        &self,
        lines: &[String],
        x: f64,
        first_baseline: f64,
        line_height: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<TextLine> {
        lines
            .iter()
            .enumerate()
            .map(|(i, text)| self.line_at(text, x, first_baseline + i as f64 * line_height, font, font_size))
            .collect()
    }
}

// ── Serializable layout metadata (for debug overlays / dev tools) ───

/// Complete layout metadata for all pages.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub pages: Vec<PageInfo>,
}

/// Layout metadata for a single page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub kind: PageKind,
    pub elements: Vec<ElementInfo>,
}

/// Layout metadata for a single positioned element (hierarchical).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// DrawCommand-based kind (Rect, Line, Text, Image, None).
    pub kind: String,
    pub role: ElementRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Photo slot drawn by an Image element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<usize>,
    pub children: Vec<ElementInfo>,
}

impl LayoutInfo {
    /// Extract serializable layout metadata from laid-out pages.
    pub fn from_pages(pages: &[LayoutPage]) -> Self {
        LayoutInfo {
            pages: pages.iter().map(PageInfo::from_page).collect(),
        }
    }

    /// Every element with `role`, depth-first, across all pages.
    pub fn find_role(&self, role: ElementRole) -> Vec<&ElementInfo> {
        fn walk<'a>(elems: &'a [ElementInfo], role: ElementRole, out: &mut Vec<&'a ElementInfo>) {
            for e in elems {
                if e.role == role {
                    out.push(e);
                }
                walk(&e.children, role, out);
            }
        }
        let mut out = Vec::new();
        for page in &self.pages {
            walk(&page.elements, role, &mut out);
        }
        out
    }
}

impl PageInfo {
    pub fn from_page(page: &LayoutPage) -> Self {
        PageInfo {
            width: page.width,
            height: page.height,
            kind: page.kind,
            elements: build_element_tree(&page.elements),
        }
    }
}

fn build_element_tree(elems: &[LayoutElement]) -> Vec<ElementInfo> {
    elems
        .iter()
        .map(|elem| {
            let kind = match &elem.draw {
                DrawCommand::None => "None",
                DrawCommand::Rect { .. } => "Rect",
                DrawCommand::Line { .. } => "Line",
                DrawCommand::Text { .. } => "Text",
                DrawCommand::Image { .. } => "Image",
            };
            let slot = match elem.draw {
                DrawCommand::Image { slot } => Some(slot),
                _ => None,
            };
            ElementInfo {
                x: elem.x,
                y: elem.y,
                width: elem.width,
                height: elem.height,
                kind: kind.to_string(),
                role: elem.role,
                text_content: elem.text_content(),
                slot,
                children: build_element_tree(&elem.children),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_counter_is_monotonic() {
        let mut counter = FigureCounter::new();
        assert_eq!(counter.peek(), 1);
        assert_eq!(counter.issued(), 0);
        assert_eq!(counter.next_number(), 1);
        assert_eq!(counter.next_number(), 2);
        assert_eq!(counter.peek(), 3);
        assert_eq!(counter.issued(), 2);
    }

    #[test]
    fn test_frame_sits_halfway_into_margin() {
        let config = LayoutConfig::default();
        let frame = PageRenderer::new(&config).frame();
        assert_eq!(frame.role, ElementRole::Frame);
        assert!((frame.x - config.margin / 2.0).abs() < 1e-9);
        assert!((frame.bounds().right() - (config.page_width - config.margin / 2.0)).abs() < 1e-9);
        assert!((frame.bounds().bottom() - (config.page_height - config.margin / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_text_element_bounds_cover_lines() {
        let lines = vec![
            TextLine { x: 10.0, y: 100.0, text: "ab".into(), width: 20.0 },
            TextLine { x: 5.0, y: 112.0, text: "abcd".into(), width: 40.0 },
        ];
        let el = LayoutElement::text(ElementRole::Caption, lines, StandardFont::Helvetica, 10.0, Color::BLACK);
        assert_eq!(el.x, 5.0);
        assert_eq!(el.width, 40.0);
        assert!(el.y < 100.0 && el.bounds().bottom() > 112.0);
        assert_eq!(el.text_content().as_deref(), Some("ab abcd"));
    }

    #[test]
    fn test_layout_info_serializes_roles_and_slots() {
        let page = LayoutPage {
            width: 100.0,
            height: 200.0,
            kind: PageKind::Content { number: 3 },
            elements: vec![LayoutElement {
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 4.0,
                draw: DrawCommand::Image { slot: 0 },
                role: ElementRole::Figure,
                children: vec![],
            }],
        };
        let info = LayoutInfo::from_pages(&[page]);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["pages"][0]["kind"], "content");
        assert_eq!(json["pages"][0]["number"], 3);
        assert_eq!(json["pages"][0]["elements"][0]["role"], "Figure");
        assert_eq!(json["pages"][0]["elements"][0]["slot"], 0);
        assert_eq!(info.find_role(ElementRole::Figure).len(), 1);
    }
}
