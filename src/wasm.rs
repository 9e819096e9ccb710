use wasm_bindgen::prelude::*;

use crate::assemble::Assembler;
use crate::config::LayoutConfig;
use crate::error::ReportError;
use crate::model::ReportDocument;

/// Render a report given as a JSON string.
#[wasm_bindgen]
pub fn render_report(json: &str) -> Result<Vec<u8>, JsValue> {
    let document = crate::parse_document(json).map_err(to_js)?;
    render_document(&document)
}

/// Render a report given as a plain JS object.
#[wasm_bindgen]
pub fn render_report_value(value: JsValue) -> Result<Vec<u8>, JsValue> {
    let document: ReportDocument = serde_wasm_bindgen::from_value(value)
        .map_err(|e| to_js(ReportError::MalformedDocument(e.to_string())))?;
    render_document(&document)
}

fn render_document(document: &ReportDocument) -> Result<Vec<u8>, JsValue> {
    Assembler::new(LayoutConfig::default())
        .with_generated_at(browser_timestamp())
        .render_pdf(document)
        .map_err(to_js)
}

/// Local time from the JS clock, `dd/mm/yyyy - HH:MM`.
fn browser_timestamp() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:02}/{:02}/{} - {:02}:{:02}",
        now.get_date(),
        now.get_month() + 1,
        now.get_full_year(),
        now.get_hours(),
        now.get_minutes()
    )
}

fn to_js(e: ReportError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
