//! Cover sheet: title, details table, optional description, timestamp.

use chrono::{DateTime, TimeZone};

use crate::config::MM;
use crate::font::StandardFont;
use crate::model::ReportDocument;
use crate::text::centered_offset;

use super::{
    Color, ElementRole, LayoutElement, LayoutPage, PageKind, PageRenderer, Rect, BOX_PADDING,
    CELL_BASELINE, CELL_PADDING,
};

/// First description baseline below the box top.
const DESCRIPTION_BASELINE: f64 = 7.0 * MM;

/// Format a generation time the way the cover prints it: `dd/mm/yyyy - HH:MM`.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%d/%m/%Y - %H:%M").to_string()
}

enum DetailsRow<'d> {
    Single { label: &'d str, value: &'d str },
    EngineerCrea { engineer: &'d str, crea: &'d str },
}

fn present(value: &str) -> Option<&str> {
    let v = value.trim();
    (!v.is_empty()).then_some(v)
}

impl PageRenderer<'_> {
    /// Lay out the cover page. `generated_at` is printed verbatim after the
    /// "generated at" label.
    pub fn render_cover(&self, doc: &ReportDocument, generated_at: &str) -> LayoutPage {
        let c = self.config;
        let mut elements = vec![self.frame()];

        let title = &c.labels.cover_title;
        let title_font = StandardFont::HelveticaBold;
        let title_w = self.measure(title, title_font, c.cover_title_size);
        elements.push(LayoutElement::text(
            ElementRole::Title,
            vec![self.line_at(
                title,
                centered_offset(title_w, c.page_width),
                c.cover_title_baseline,
                title_font,
                c.cover_title_size,
            )],
            title_font,
            c.cover_title_size,
            Color::BLACK,
        ));

        let mut y = c.table_top;
        for row in self.details_rows(doc) {
            let element = self.details_row(&row, y);
            y += element.height;
            elements.push(element);
        }

        if let Some(description) = present(&doc.details.description) {
            elements.push(self.description_box(description, y));
        }

        let stamp = format!("{} {}", c.labels.generated_at, generated_at);
        let font = StandardFont::Helvetica;
        elements.push(LayoutElement::text(
            ElementRole::Timestamp,
            vec![self.line_at(&stamp, c.margin, c.page_height - c.timestamp_bottom, font, c.footer_font_size)],
            font,
            c.footer_font_size,
            Color::from_rgb8(80, 80, 80),
        ));

        LayoutPage {
            width: c.page_width,
            height: c.page_height,
            kind: PageKind::Cover,
            elements,
        }
    }

    /// Non-empty detail rows in table order. Engineer and CREA share a row
    /// when both are present.
    fn details_rows<'d>(&'d self, doc: &'d ReportDocument) -> Vec<DetailsRow<'d>> {
        let labels = &self.config.labels;
        let d = &doc.details;
        let mut rows: Vec<DetailsRow<'d>> = [
            (labels.client.as_str(), d.client_name.as_str()),
            (labels.number.as_str(), d.number.as_str()),
            (labels.address.as_str(), d.address.as_str()),
            (labels.subject.as_str(), doc.name.as_str()),
        ]
        .into_iter()
        .filter_map(|(label, value)| present(value).map(|value| DetailsRow::Single { label, value }))
        .collect();

        match (present(&d.engineer), present(&d.crea)) {
            (Some(engineer), Some(crea)) => rows.push(DetailsRow::EngineerCrea { engineer, crea }),
            (Some(value), None) => rows.push(DetailsRow::Single {
                label: &labels.engineer,
                value,
            }),
            (None, Some(value)) => rows.push(DetailsRow::Single {
                label: &labels.crea,
                value,
            }),
            (None, None) => {}
        }
        rows
    }

    fn details_row(&self, row: &DetailsRow<'_>, y: f64) -> LayoutElement {
        let c = self.config;
        let label_w = c.table_label_width;
        let value_x = c.margin + label_w;
        let value_w = c.content_width() - label_w;
        let size = c.table_font_size;
        let (regular, bold) = (StandardFont::Helvetica, StandardFont::HelveticaBold);

        let label = match row {
            DetailsRow::Single { label, .. } => *label,
            DetailsRow::EngineerCrea { .. } => c.labels.engineer.as_str(),
        };

        // (cell rect, texts) pairs, heights fixed once every cell is wrapped
        let mut cells: Vec<(Rect, Vec<LayoutElement>)> = Vec::new();
        let mut line_count = 1;

        let label_text = format!("{}:", label);
        cells.push((
            Rect::new(c.margin, y, label_w, 0.0),
            vec![self.cell_text(&[label_text], c.margin + CELL_PADDING, y, bold)],
        ));

        match row {
            DetailsRow::Single { value, .. } => {
                let lines = self.wrap(value, value_w - 2.0 * CELL_PADDING, regular, size);
                line_count = line_count.max(lines.len());
                cells.push((
                    Rect::new(value_x, y, value_w, 0.0),
                    vec![self.cell_text(&lines, value_x + CELL_PADDING, y, regular)],
                ));
            }
            DetailsRow::EngineerCrea { engineer, crea } => {
                let eng_w = value_w / 2.0;
                let crea_w = value_w - eng_w;
                let crea_x = value_x + eng_w;
                let crea_value_x = crea_x + CELL_PADDING + c.crea_value_offset;

                let eng_lines = self.wrap(engineer, eng_w - 2.0 * CELL_PADDING, regular, size);
                let crea_lines = self.wrap(
                    crea,
                    crea_x + crea_w - CELL_PADDING - crea_value_x,
                    regular,
                    size,
                );
                line_count = line_count.max(eng_lines.len()).max(crea_lines.len());

                cells.push((
                    Rect::new(value_x, y, eng_w, 0.0),
                    vec![self.cell_text(&eng_lines, value_x + CELL_PADDING, y, regular)],
                ));
                let crea_label = format!("{}:", c.labels.crea);
                cells.push((
                    Rect::new(crea_x, y, crea_w, 0.0),
                    vec![
                        self.cell_text(&[crea_label], crea_x + CELL_PADDING, y, bold),
                        self.cell_text(&crea_lines, crea_value_x, y, regular),
                    ],
                ));
            }
        }

        let row_h = c.table_row_height + (line_count - 1) as f64 * c.table_line_height;
        let children = cells
            .into_iter()
            .map(|(mut rect, texts)| {
                rect.height = row_h;
                let mut cell = LayoutElement::rect(
                    ElementRole::DetailsRow,
                    rect,
                    None,
                    Some(Color::BLACK),
                    c.table_line_width,
                );
                cell.children = texts;
                cell
            })
            .collect();

        LayoutElement::group(
            ElementRole::DetailsRow,
            Rect::new(c.margin, y, c.content_width(), row_h),
            children,
        )
    }

    fn cell_text(&self, lines: &[String], x: f64, cell_top: f64, font: StandardFont) -> LayoutElement {
        let c = self.config;
        LayoutElement::text(
            ElementRole::DetailsRow,
            self.left_lines(lines, x, cell_top + CELL_BASELINE, c.table_line_height, font, c.table_font_size),
            font,
            c.table_font_size,
            Color::BLACK,
        )
    }

    fn description_box(&self, description: &str, y: f64) -> LayoutElement {
        let c = self.config;
        let width = c.content_width();
        let font = StandardFont::Helvetica;
        let lines = self.wrap(description, width - BOX_PADDING, font, c.table_font_size);
        let height = c
            .description_min_height
            .max(lines.len() as f64 * c.description_line_height + BOX_PADDING);

        let mut element = LayoutElement::rect(
            ElementRole::DescriptionBox,
            Rect::new(c.margin, y, width, height),
            None,
            Some(Color::BLACK),
            c.table_line_width,
        );
        element.children.push(LayoutElement::text(
            ElementRole::DescriptionBox,
            self.centered_lines(
                &lines,
                c.margin,
                width,
                y + DESCRIPTION_BASELINE,
                c.description_line_height,
                font,
                c.table_font_size,
            ),
            font,
            c.table_font_size,
            Color::BLACK,
        ));
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::DrawCommand;
    use crate::model::ReportDetails;

    fn doc(details: ReportDetails, name: &str) -> ReportDocument {
        ReportDocument {
            name: name.to_string(),
            details,
            pages: vec![],
        }
    }

    fn rows(page: &LayoutPage) -> Vec<&LayoutElement> {
        page.elements
            .iter()
            .filter(|e| e.role == ElementRole::DetailsRow)
            .collect()
    }

    /// All text drawn inside a row, cell by cell.
    fn row_texts(row: &LayoutElement) -> Vec<String> {
        row.children
            .iter()
            .flat_map(|cell| cell.children.iter().filter_map(|t| t.text_content()))
            .collect()
    }

    fn cover(details: ReportDetails, name: &str) -> LayoutPage {
        let config = LayoutConfig::default();
        PageRenderer::new(&config).render_cover(&doc(details, name), "18/10/2026 - 09:05")
    }

    #[test]
    fn test_empty_rows_are_omitted() {
        let details = ReportDetails {
            client_name: "Acme".into(),
            number: "".into(),
            address: "Rua X".into(),
            engineer: "".into(),
            crea: "  ".into(),
            ..Default::default()
        };
        let page = cover(details, "");
        let rows = rows(&page);
        assert_eq!(rows.len(), 2);
        assert_eq!(row_texts(rows[0]), vec!["Cliente:", "Acme"]);
        assert_eq!(row_texts(rows[1]), vec!["Endereço:", "Rua X"]);
        assert_eq!(page.kind, PageKind::Cover);
    }

    #[test]
    fn test_rows_follow_table_order_and_stack() {
        let details = ReportDetails {
            client_name: "Acme".into(),
            number: "NT-7".into(),
            ..Default::default()
        };
        let config = LayoutConfig::default();
        let page = cover(details, "Vistoria");
        let rows = rows(&page);
        assert_eq!(rows.len(), 3);
        assert_eq!(row_texts(rows[2]), vec!["Assunto:", "Vistoria"]);
        assert!((rows[0].y - config.table_top).abs() < 1e-9);
        assert!((rows[1].y - rows[0].bounds().bottom()).abs() < 1e-9);
        assert!((rows[0].height - config.table_row_height).abs() < 1e-9);
    }

    #[test]
    fn test_engineer_and_crea_share_a_row() {
        let details = ReportDetails {
            engineer: "Maria Souza".into(),
            crea: "123456/D".into(),
            ..Default::default()
        };
        let page = cover(details, "");
        let rows = rows(&page);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].children.len(), 3);
        assert_eq!(
            row_texts(rows[0]),
            vec!["Engenheiro:", "Maria Souza", "CREA:", "123456/D"]
        );
        let (eng, crea) = (&rows[0].children[1], &rows[0].children[2]);
        assert!((eng.width - crea.width).abs() < 1e-9);
        assert!((eng.bounds().right() - crea.x).abs() < 1e-9);
    }

    #[test]
    fn test_lone_engineer_or_crea_gets_full_row() {
        let only_crea = ReportDetails {
            crea: "123456/D".into(),
            ..Default::default()
        };
        let page = cover(only_crea, "");
        let crea_rows = rows(&page);
        assert_eq!(crea_rows.len(), 1);
        assert_eq!(crea_rows[0].children.len(), 2);
        assert_eq!(row_texts(crea_rows[0]), vec!["CREA:", "123456/D"]);

        let only_engineer = ReportDetails {
            engineer: "Maria".into(),
            ..Default::default()
        };
        let page = cover(only_engineer, "");
        let engineer_rows = rows(&page);
        assert_eq!(engineer_rows.len(), 1);
        assert_eq!(row_texts(engineer_rows[0]), vec!["Engenheiro:", "Maria"]);
    }

    #[test]
    fn test_long_value_grows_row() {
        let details = ReportDetails {
            address: "Avenida das Nações Unidas, 12901, Torre Norte, 25º andar, conjunto 2501, Brooklin Paulista, São Paulo".into(),
            ..Default::default()
        };
        let config = LayoutConfig::default();
        let page = cover(details, "");
        let row = rows(&page)[0];
        let value = &row.children[1].children[0];
        let n = match &value.draw {
            DrawCommand::Text { lines, .. } => lines.len(),
            _ => panic!("value cell should hold text"),
        };
        assert!(n > 1);
        let expected = config.table_row_height + (n - 1) as f64 * config.table_line_height;
        assert!((row.height - expected).abs() < 1e-9);
        assert!((row.children[0].height - expected).abs() < 1e-9);
    }

    #[test]
    fn test_description_box_has_min_height() {
        let config = LayoutConfig::default();
        let short = ReportDetails {
            description: "Vistoria de rotina.".into(),
            ..Default::default()
        };
        let page = cover(short, "");
        let boxes: Vec<_> = page
            .elements
            .iter()
            .filter(|e| e.role == ElementRole::DescriptionBox)
            .collect();
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].height - config.description_min_height).abs() < 1e-9);
        assert!((boxes[0].y - config.table_top).abs() < 1e-9);
        let text = &boxes[0].children[0];
        assert!((text.bounds().center_x() - boxes[0].bounds().center_x()).abs() < 1e-6);

        let long = ReportDetails {
            description: "Linha\n".repeat(6),
            ..Default::default()
        };
        let page = cover(long, "");
        let b = page
            .elements
            .iter()
            .find(|e| e.role == ElementRole::DescriptionBox)
            .unwrap();
        assert!((b.height - (6.0 * config.description_line_height + BOX_PADDING)).abs() < 1e-9);
    }

    #[test]
    fn test_blank_description_has_no_box() {
        let details = ReportDetails {
            description: " \n ".into(),
            ..Default::default()
        };
        let page = cover(details, "");
        assert!(page.elements.iter().all(|e| e.role != ElementRole::DescriptionBox));
    }

    #[test]
    fn test_title_frame_and_timestamp() {
        let config = LayoutConfig::default();
        let page = cover(ReportDetails::default(), "");
        assert_eq!(page.elements[0].role, ElementRole::Frame);

        let title = page.elements.iter().find(|e| e.role == ElementRole::Title).unwrap();
        assert_eq!(title.text_content().as_deref(), Some("RELATÓRIO FOTOGRÁFICO"));
        assert!((title.bounds().center_x() - config.page_width / 2.0).abs() < 1e-6);

        let stamp = page.elements.iter().find(|e| e.role == ElementRole::Timestamp).unwrap();
        assert_eq!(stamp.text_content().as_deref(), Some("Gerado em: 18/10/2026 - 09:05"));
        match &stamp.draw {
            DrawCommand::Text { lines, color, .. } => {
                assert_eq!(*color, Color::from_rgb8(80, 80, 80));
                assert!((lines[0].x - config.margin).abs() < 1e-9);
                assert!((lines[0].y - (config.page_height - config.timestamp_bottom)).abs() < 1e-9);
            }
            _ => panic!("timestamp should be text"),
        }
    }

    #[test]
    fn test_format_timestamp() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 3, 7, 14, 5, 0).unwrap();
        assert_eq!(format_timestamp(&at), "07/03/2026 - 14:05");
    }
}
