//! Content pages: title between rules, optional text box, photo grid and
//! page number.

use crate::font::StandardFont;
use crate::model::ReportPage;
use crate::text::centered_offset;

use super::grid::{self, CellContent, GridItem};
use super::{
    Color, DrawCommand, ElementRole, FigureCounter, LayoutElement, LayoutPage, PageKind,
    PageRenderer, PhotoSlot, Rect, BOX_PADDING,
};

const PLACEHOLDER_FILL: u8 = 245;

impl PageRenderer<'_> {
    /// Lay out one report page.
    ///
    /// `slots` are the page's photos in render order. Each one takes the
    /// next number from `figures`, whether or not its image resolved.
    /// `page_number` is the 1-based index among content pages.
    pub fn render_content(
        &self,
        page: &ReportPage,
        slots: &[PhotoSlot<'_>],
        page_number: usize,
        figures: &mut FigureCounter,
    ) -> LayoutPage {
        let c = self.config;
        let mut elements = vec![self.frame()];

        let mut y = c.margin + c.title_offset;
        elements.extend(self.title_block(&page.title, y));
        y += c.title_advance;

        if let Some(content_box) = self.content_box(&page.content, y) {
            y += content_box.height + c.content_spacing;
            elements.push(content_box);
        }

        if !slots.is_empty() {
            let items: Vec<GridItem> = slots
                .iter()
                .map(|slot| GridItem {
                    size: slot.natural_size(),
                    caption: self.caption(figures.next_number(), &slot.photo.subtitle),
                })
                .collect();

            let packed = grid::pack(
                &items,
                page.layout.effective_columns(),
                c.margin,
                y,
                c.content_width(),
                c,
                &self.fonts,
            );

            let grid_bottom = y + packed.height - c.caption_reserved_height;
            if grid_bottom > c.content_bottom() {
                log::warn!(
                    "page '{}': photo grid ends {:.1}pt below the bottom margin",
                    page.id,
                    grid_bottom - c.content_bottom()
                );
            }

            for cell in packed.cells {
                elements.push(match cell.content {
                    CellContent::Image => LayoutElement {
                        x: cell.draw.x,
                        y: cell.draw.y,
                        width: cell.draw.width,
                        height: cell.draw.height,
                        draw: DrawCommand::Image { slot: cell.slot },
                        role: ElementRole::Figure,
                        children: Vec::new(),
                    },
                    CellContent::Placeholder => self.placeholder(cell.draw),
                });
                if !cell.caption.is_empty() {
                    elements.push(LayoutElement::text(
                        ElementRole::Caption,
                        cell.caption,
                        StandardFont::HelveticaBold,
                        c.caption_font_size,
                        Color::BLACK,
                    ));
                }
            }
        }

        elements.push(self.page_number(page_number));

        LayoutPage {
            width: c.page_width,
            height: c.page_height,
            kind: PageKind::Content {
                number: page_number,
            },
            elements,
        }
    }

    /// `Figura 3: subtitle`, or just `Figura 3` when there is no subtitle.
    fn caption(&self, number: u32, subtitle: &str) -> String {
        let figure = &self.config.labels.figure;
        match subtitle.trim() {
            "" => format!("{} {}", figure, number),
            sub => format!("{} {}: {}", figure, number, sub),
        }
    }

    /// Upper-cased title centred on `baseline` with a rule above and below.
    fn title_block(&self, title: &str, baseline: f64) -> Vec<LayoutElement> {
        let c = self.config;
        let title = match title.trim() {
            "" => c.labels.untitled.to_uppercase(),
            t => t.to_uppercase(),
        };
        let font = StandardFont::HelveticaBold;
        let width = self.measure(&title, font, c.page_title_size);
        let right = c.page_width - c.margin;

        vec![
            LayoutElement::text(
                ElementRole::Title,
                vec![self.line_at(&title, centered_offset(width, c.page_width), baseline, font, c.page_title_size)],
                font,
                c.page_title_size,
                Color::BLACK,
            ),
            LayoutElement::rule(c.margin, right, baseline - c.title_rule_above, c.box_line_width),
            LayoutElement::rule(c.margin, right, baseline + c.title_rule_below, c.box_line_width),
        ]
    }

    fn content_box(&self, content: &str, y: f64) -> Option<LayoutElement> {
        let c = self.config;
        let font = StandardFont::Helvetica;
        let width = c.content_width();
        let lines = self.wrap(content, width - c.content_inset, font, c.body_font_size);
        if lines.is_empty() {
            return None;
        }
        let height = lines.len() as f64 * c.content_line_height + BOX_PADDING;

        let mut element = LayoutElement::rect(
            ElementRole::ContentBox,
            Rect::new(c.margin, y, width, height),
            None,
            Some(Color::BLACK),
            c.box_line_width,
        );
        element.children.push(LayoutElement::text(
            ElementRole::ContentBox,
            self.centered_lines(&lines, c.margin, width, y + BOX_PADDING, c.content_line_height, font, c.body_font_size),
            font,
            c.body_font_size,
            Color::BLACK,
        ));
        Some(element)
    }

    /// Grey box with a centred "image unavailable" label.
    fn placeholder(&self, bounds: Rect) -> LayoutElement {
        let c = self.config;
        let font = StandardFont::Helvetica;
        let label = &c.labels.image_unavailable;
        let width = self.measure(label, font, c.footer_font_size);

        let mut element = LayoutElement::rect(
            ElementRole::Placeholder,
            bounds,
            Some(Color::from_rgb8(PLACEHOLDER_FILL, PLACEHOLDER_FILL, PLACEHOLDER_FILL)),
            Some(Color::BLACK),
            c.box_line_width,
        );
        element.children.push(LayoutElement::text(
            ElementRole::Placeholder,
            vec![self.line_at(
                label,
                bounds.x + centered_offset(width, bounds.width),
                bounds.center_y(),
                font,
                c.footer_font_size,
            )],
            font,
            c.footer_font_size,
            Color::BLACK,
        ));
        element
    }

    fn page_number(&self, number: usize) -> LayoutElement {
        let c = self.config;
        let font = StandardFont::Helvetica;
        let text = format!("{} {}", c.labels.page, number);
        let width = self.measure(&text, font, c.footer_font_size);
        LayoutElement::text(
            ElementRole::PageNumber,
            vec![self.line_at(
                &text,
                c.page_width - c.margin - width,
                c.page_height - c.page_number_bottom,
                font,
                c.footer_font_size,
            )],
            font,
            c.footer_font_size,
            Color::BLACK,
        )
    }
}
