//! Integration tests for the photoreport pipeline.
//!
//! These tests exercise the full path from report input to output:
//! - JSON deserialization of builder documents
//! - Page count and ordering (cover first, one page per report page)
//! - Figure numbering across pages, placeholders included
//! - PDF output is structurally valid and embeds the resolved photos

use base64::Engine;

use photoreport::layout::{ElementRole, LayoutInfo, PageKind};
use photoreport::model::ReportDetails;
use photoreport::{
    Assembler, CancelFlag, LayoutConfig, LayoutRecorder, PhotoRef, ReportDocument, ReportError,
    ReportPage,
};

// ─── Helpers ────────────────────────────────────────────────────

fn jpeg_data_uri(w: u32, h: u32) -> String {
    let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, 90]));
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgb8).unwrap();
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf)
    )
}

fn photo(subtitle: &str) -> PhotoRef {
    PhotoRef::embedded(&jpeg_data_uri(8, 6), subtitle)
}

fn assembler() -> Assembler {
    Assembler::new(LayoutConfig::default()).with_generated_at("18/10/2026 - 10:00")
}

fn layout(doc: &ReportDocument) -> LayoutInfo {
    assembler().run(doc, LayoutRecorder::new()).unwrap()
}

fn render_to_pdf(doc: &ReportDocument) -> Vec<u8> {
    assembler().render_pdf(doc).unwrap()
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-1.7"), "Should start with PDF header");
    assert!(bytes.windows(5).any(|w| w == b"%%EOF"), "Should end with EOF marker");
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Should have xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Should have trailer");
}

fn captions(info: &LayoutInfo) -> Vec<String> {
    info.find_role(ElementRole::Caption)
        .iter()
        .filter_map(|e| e.text_content.clone())
        .collect()
}

/// The document from the acceptance scenario: an empty intro page and a
/// page with three photos in two columns.
fn relatorio_teste() -> ReportDocument {
    ReportDocument {
        name: "Relatório Teste".to_string(),
        details: ReportDetails::default(),
        pages: vec![
            ReportPage::new("1", "Intro", "", vec![]),
            ReportPage::new("2", "Fotos", "", vec![photo("A"), photo("B"), photo("C")]).with_columns(2),
        ],
    }
}

// ─── Tests ──────────────────────────────────────────────────────

#[test]
fn test_relatorio_teste_pages_and_figures() {
    let doc = relatorio_teste();
    let info = layout(&doc);

    assert_eq!(info.pages.len(), 3);
    assert_eq!(info.pages[0].kind, PageKind::Cover);
    assert_eq!(info.pages[1].kind, PageKind::Content { number: 1 });
    assert_eq!(info.pages[2].kind, PageKind::Content { number: 2 });

    let fotos = LayoutInfo {
        pages: vec![info.pages[2].clone()],
    };
    assert_eq!(captions(&fotos), vec!["Figura 1: A", "Figura 2: B", "Figura 3: C"]);
    assert_eq!(fotos.find_role(ElementRole::Figure).len(), 3);

    let pdf = render_to_pdf(&doc);
    assert_valid_pdf(&pdf);
    assert_eq!(count(&pdf, b"/Type /Page "), 3);
    assert_eq!(count(&pdf, b"/Filter /DCTDecode"), 3);
}

#[test]
fn test_figures_are_numbered_one_to_n() {
    let pages: Vec<ReportPage> = (0..5)
        .map(|i| {
            let photos = (0..i).map(|_| photo("")).collect();
            ReportPage::new(&format!("p{i}"), "Página", "", photos).with_columns((i % 3) as i64 + 1)
        })
        .collect();
    let doc = ReportDocument {
        name: "Numeração".into(),
        pages,
        ..Default::default()
    };

    let info = layout(&doc);
    let expected: Vec<String> = (1..=doc.photo_count()).map(|n| format!("Figura {n}")).collect();
    assert_eq!(captions(&info), expected);
}

#[test]
fn test_cover_is_never_numbered() {
    let info = layout(&relatorio_teste());
    let numbers: Vec<_> = info
        .find_role(ElementRole::PageNumber)
        .iter()
        .filter_map(|e| e.text_content.clone())
        .collect();
    assert_eq!(numbers, vec!["Página 1", "Página 2"]);
    assert!(info.pages[0]
        .elements
        .iter()
        .all(|e| e.role != ElementRole::PageNumber));
}

#[test]
fn test_unresolvable_photos_become_placeholders() {
    let doc = ReportDocument {
        name: "Falhas".into(),
        pages: vec![ReportPage::new(
            "1",
            "Fotos",
            "",
            vec![
                photo("boa"),
                PhotoRef::from_url("./nao/existe.jpg", "perdida"),
                PhotoRef::embedded("data:image/png;base64,AAAA", "corrompida"),
                PhotoRef::default(),
            ],
        )],
        ..Default::default()
    };

    let info = layout(&doc);
    assert_eq!(
        captions(&info),
        vec!["Figura 1: boa", "Figura 2: perdida", "Figura 3: corrompida", "Figura 4"]
    );
    let boxes: Vec<_> = info
        .find_role(ElementRole::Placeholder)
        .into_iter()
        .filter(|e| e.kind == "Rect")
        .collect();
    assert_eq!(boxes.len(), 3);

    let pdf = render_to_pdf(&doc);
    assert_valid_pdf(&pdf);
    assert_eq!(count(&pdf, b"/Subtype /Image"), 1);
}

#[test]
fn test_photo_order_applies_within_page() {
    let page = ReportPage::new("1", "Ordem", "", vec![photo("A"), photo("B"), photo("C")])
        .with_photo_order(vec![2, 0, 1]);
    let stale = ReportPage::new("2", "Ordem", "", vec![photo("D"), photo("E")]).with_photo_order(vec![2, 0, 1]);
    let doc = ReportDocument {
        name: "Ordem".into(),
        pages: vec![page, stale],
        ..Default::default()
    };
    assert_eq!(
        captions(&layout(&doc)),
        vec!["Figura 1: C", "Figura 2: A", "Figura 3: B", "Figura 4: D", "Figura 5: E"]
    );
}

#[test]
fn test_zero_columns_renders_one_per_row() {
    let doc = ReportDocument {
        name: "Colunas".into(),
        pages: vec![ReportPage::new("1", "T", "", vec![photo(""), photo("")]).with_columns(0)],
        ..Default::default()
    };
    let info = layout(&doc);
    let config = LayoutConfig::default();
    let frames: Vec<_> = info
        .find_role(ElementRole::Caption)
        .iter()
        .map(|c| c.y)
        .collect();
    assert_eq!(frames.len(), 2);
    let advance = config.target_row_height + config.caption_reserved_height;
    assert!((frames[1] - frames[0] - advance).abs() < 1e-6);
}

#[test]
fn test_json_input_end_to_end() {
    let json = format!(
        r#"{{
            "name": "Vistoria",
            "details": {{ "clientName": "Acme", "number": "", "address": "Rua X", "engineer": "", "crea": "" }},
            "pages": [
                {{ "id": "a", "title": "Fachada", "content": "Sem anomalias.", "photos": [
                    {{ "data": "{}", "subtitle": "Vista frontal" }}
                ], "layout": {{ "columns": 2, "photoOrder": [] }} }}
            ]
        }}"#,
        jpeg_data_uri(4, 4)
    );
    let pdf = photoreport::render_json(&json).unwrap();
    assert_valid_pdf(&pdf);
    assert_eq!(count(&pdf, b"/Type /Page "), 2);

    let doc = photoreport::parse_document(&json).unwrap();
    let info = photoreport::render_layout(&doc).unwrap();
    let rows = info.pages[0]
        .elements
        .iter()
        .filter(|e| e.role == ElementRole::DetailsRow)
        .count();
    // Cliente, Endereço and Assunto (the report name)
    assert_eq!(rows, 3);
}

#[test]
fn test_pages_must_be_a_sequence() {
    let err = photoreport::render_json(r#"{"name": "x", "pages": {"id": "a"}}"#).unwrap_err();
    assert!(matches!(err, ReportError::ParseError { .. }));
    let err = photoreport::render_json(r#"{"name": "x"}"#).unwrap_err();
    assert!(matches!(err, ReportError::ParseError { .. }));
}

#[test]
fn test_negative_columns_are_malformed() {
    let doc = ReportDocument {
        name: "x".into(),
        pages: vec![ReportPage::new("1", "T", "", vec![]).with_columns(-1)],
        ..Default::default()
    };
    assert!(matches!(photoreport::render(&doc), Err(ReportError::MalformedDocument(_))));
}

#[test]
fn test_cancelled_run_returns_no_bytes() {
    let flag = CancelFlag::new();
    flag.cancel();
    let result = assembler().with_cancel(flag).render_pdf(&relatorio_teste());
    assert!(matches!(result, Err(ReportError::Cancelled)));
}

#[test]
fn test_layout_json_is_serializable() {
    let info = layout(&relatorio_teste());
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["pages"].as_array().unwrap().len(), 3);
    assert_eq!(json["pages"][0]["kind"], "cover");
    assert_eq!(json["pages"][2]["number"], 2);
}
