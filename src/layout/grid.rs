//! # Photo Grid
//!
//! Row-major packing of photos into a fixed number of columns. Every box in
//! the grid has the same height (`target_row_height`); images are scaled to
//! fit their box without distortion and centred in it. Captions hang below
//! each box in the space reserved between rows.
//!
//! One special case: when the last row holds a single photo and the grid
//! has more than one column, that photo's box spans the full usable width
//! instead of sitting alone in a narrow slot.

use crate::config::LayoutConfig;
use crate::font::{FontContext, StandardFont};
use crate::text::{centered_offset, TextLayout};

use super::{Rect, TextLine};

/// One photo to place. `size` is its natural pixel size, `None` when the
/// photo failed to resolve.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub size: Option<(u32, u32)>,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContent {
    Image,
    Placeholder,
}

/// A placed photo.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// Index of the item this cell was made from.
    pub slot: usize,
    pub content: CellContent,
    /// The grid box the photo is fitted into.
    pub frame: Rect,
    /// Where the image (or placeholder) is actually painted.
    pub draw: Rect,
    pub caption: Vec<TextLine>,
}

#[derive(Debug, Clone)]
pub struct PackedGrid {
    pub cells: Vec<GridCell>,
    /// Vertical space consumed, captions included.
    pub height: f64,
}

/// Lay out `items` in `columns` columns starting at `(origin_x, origin_y)`.
pub fn pack(
    items: &[GridItem],
    columns: usize,
    origin_x: f64,
    origin_y: f64,
    usable_width: f64,
    config: &LayoutConfig,
    fonts: &FontContext,
) -> PackedGrid {
    let columns = columns.max(1);
    let col_width = (usable_width - (columns - 1) as f64 * config.gap) / columns as f64;
    let box_height = config.target_row_height;
    let row_advance = box_height + config.caption_reserved_height;
    let text_layout = TextLayout::new();

    let mut cells = Vec::with_capacity(items.len());
    let mut y = origin_y;

    for (row_index, row) in items.chunks(columns).enumerate() {
        // chunks() only yields a short row at the end
        let span_last = row.len() == 1 && columns > 1;
        let box_width = if span_last { usable_width } else { col_width };

        for (col, item) in row.iter().enumerate() {
            let frame = Rect::new(
                origin_x + col as f64 * (col_width + config.gap),
                y,
                box_width,
                box_height,
            );
            let (content, draw) = match item.size {
                Some((w, h)) if w > 0 && h > 0 => (CellContent::Image, aspect_fit(&frame, w, h)),
                _ => (CellContent::Placeholder, frame),
            };

            let caption = caption_lines(&text_layout, fonts, &item.caption, &frame, config);

            cells.push(GridCell {
                slot: row_index * columns + col,
                content,
                frame,
                draw,
                caption,
            });
        }

        y += row_advance;
    }

    PackedGrid {
        cells,
        height: y - origin_y,
    }
}

/// Scale a `natural_w` x `natural_h` image to fit inside `frame`, preserving
/// its aspect ratio, centred on both axes.
pub fn aspect_fit(frame: &Rect, natural_w: u32, natural_h: u32) -> Rect {
    let (nw, nh) = (natural_w as f64, natural_h as f64);
    let scale = (frame.width / nw).min(frame.height / nh);
    let (w, h) = (nw * scale, nh * scale);
    Rect::new(
        frame.x + (frame.width - w) / 2.0,
        frame.y + (frame.height - h) / 2.0,
        w,
        h,
    )
}

fn caption_lines(
    text_layout: &TextLayout,
    fonts: &FontContext,
    caption: &str,
    frame: &Rect,
    config: &LayoutConfig,
) -> Vec<TextLine> {
    let font = StandardFont::HelveticaBold;
    let size = config.caption_font_size;
    text_layout
        .wrap(fonts, caption, frame.width - config.caption_inset, font, size)
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = text_layout.measure_width(fonts, &text, font, size);
            TextLine {
                x: frame.x + centered_offset(width, frame.width),
                y: frame.bottom() + config.caption_offset + i as f64 * config.caption_line_height,
                text,
                width,
            }
        })
        .collect()
}
