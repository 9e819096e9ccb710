//! # Report Model
//!
//! The input representation for the engine: a titled report with a details
//! block and an ordered list of pages, each holding free text and photos.
//! Field names follow the JSON the report builder already produces
//! (camelCase, column settings nested under `layout`), so documents can be
//! fed in unchanged.
//!
//! The model is immutable input. Nothing in the engine mutates it.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ReportError;

/// A complete report ready for rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    /// Report name. Printed on the cover as the subject row.
    #[serde(default)]
    pub name: String,

    /// Cover sheet metadata.
    #[serde(default)]
    pub details: ReportDetails,

    /// Content pages in output order.
    pub pages: Vec<ReportPage>,
}

/// Key/value metadata shown in the cover table. Every field may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDetails {
    pub client_name: String,
    pub number: String,
    pub description: String,
    pub address: String,
    pub engineer: String,
    pub crea: String,
}

/// One logical report page. Always rendered onto exactly one physical page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Free text shown in a box under the title. May be empty.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    #[serde(default)]
    pub layout: PageLayout,
}

/// Grid settings for a page's photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    /// Photos per grid row. Negative values are rejected by validation,
    /// zero is treated as one.
    #[serde(default = "default_columns")]
    pub columns: i64,
    /// Optional permutation of indices into `photos`.
    #[serde(default)]
    pub photo_order: Vec<usize>,
}

fn default_columns() -> i64 {
    2
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            photo_order: Vec::new(),
        }
    }
}

impl PageLayout {
    /// Column count clamped to at least one.
    pub fn effective_columns(&self) -> usize {
        self.columns.max(1) as usize
    }
}

/// A reference to a photo plus its caption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    /// External locator: file path, `file://` URI or data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Embedded image bytes as base64 or a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Caption text. Empty means the figure label stands alone.
    #[serde(default)]
    pub subtitle: String,
    /// When the photo was last edited. Informational only: RFC 3339 strings
    /// and epoch milliseconds are read, anything else becomes `None`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub last_modified: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}

/// Where a photo's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource<'a> {
    /// Bytes carried inside the document.
    Embedded(&'a str),
    /// Bytes behind a locator.
    Locator(&'a str),
}

impl PhotoRef {
    /// Create a photo that points at a locator.
    pub fn from_url(url: &str, subtitle: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            subtitle: subtitle.to_string(),
            ..Default::default()
        }
    }

    /// Create a photo carrying its own bytes.
    pub fn embedded(data: &str, subtitle: &str) -> Self {
        Self {
            data: Some(data.to_string()),
            subtitle: subtitle.to_string(),
            ..Default::default()
        }
    }

    /// The photo's byte source. Embedded data wins over a locator; blank
    /// strings count as absent.
    pub fn source(&self) -> Option<PhotoSource<'_>> {
        fn non_blank(s: &Option<String>) -> Option<&str> {
            s.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        non_blank(&self.data)
            .map(PhotoSource::Embedded)
            .or_else(|| non_blank(&self.url).map(PhotoSource::Locator))
    }
}

impl ReportPage {
    /// Create a page with the default two-column layout.
    pub fn new(id: &str, title: &str, content: &str, photos: Vec<PhotoRef>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            photos,
            layout: PageLayout::default(),
        }
    }

    /// Builder-style column override.
    pub fn with_columns(mut self, columns: i64) -> Self {
        self.layout.columns = columns;
        self
    }

    /// Builder-style photo order override.
    pub fn with_photo_order(mut self, order: Vec<usize>) -> Self {
        self.layout.photo_order = order;
        self
    }

    /// Indices into `photos` in the order they are drawn.
    ///
    /// `photo_order` is used when it is a permutation of `0..photos.len()`.
    /// An empty order means array order. Anything else (a stale order left
    /// behind after a delete, an out-of-range or repeated index) falls back
    /// to array order.
    pub fn render_order(&self) -> Vec<usize> {
        let n = self.photos.len();
        let order = &self.layout.photo_order;
        if order.is_empty() {
            return (0..n).collect();
        }
        if is_permutation(order, n) {
            return order.clone();
        }
        log::warn!(
            "page '{}': photoOrder {:?} is not a permutation of {} photos, using array order",
            self.id,
            order,
            n
        );
        (0..n).collect()
    }
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in order {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

impl ReportDocument {
    /// Check the structural contract before any rendering starts.
    pub fn validate(&self) -> Result<(), ReportError> {
        let mut ids = HashSet::new();
        for (i, page) in self.pages.iter().enumerate() {
            if page.layout.columns < 0 {
                return Err(ReportError::MalformedDocument(format!(
                    "page {} ('{}') has a negative column count ({})",
                    i + 1,
                    page.id,
                    page.layout.columns
                )));
            }
            if !ids.insert(page.id.as_str()) {
                return Err(ReportError::MalformedDocument(format!(
                    "page id '{}' appears more than once",
                    page.id
                )));
            }
        }
        Ok(())
    }

    /// Total number of photos across all pages.
    pub fn photo_count(&self) -> usize {
        self.pages.iter().map(|p| p.photos.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(n: usize, order: Vec<usize>) -> ReportPage {
        let photos = (0..n)
            .map(|i| PhotoRef::from_url(&format!("./p{i}.jpg"), ""))
            .collect();
        ReportPage::new("p", "t", "", photos).with_photo_order(order)
    }

    #[test]
    fn test_render_order_identity_when_empty() {
        assert_eq!(page_with(3, vec![]).render_order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_render_order_follows_permutation() {
        assert_eq!(page_with(3, vec![2, 0, 1]).render_order(), vec![2, 0, 1]);
    }

    #[test]
    fn test_stale_order_falls_back_to_identity() {
        // One photo deleted after the order was saved
        assert_eq!(page_with(2, vec![2, 0, 1]).render_order(), vec![0, 1]);
        // Repeated index
        assert_eq!(page_with(3, vec![0, 0, 1]).render_order(), vec![0, 1, 2]);
        // Out of range but right length
        assert_eq!(page_with(2, vec![0, 5]).render_order(), vec![0, 1]);
    }

    #[test]
    fn test_columns_clamped() {
        assert_eq!(page_with(0, vec![]).with_columns(0).layout.effective_columns(), 1);
        assert_eq!(page_with(0, vec![]).with_columns(3).layout.effective_columns(), 3);
    }

    #[test]
    fn test_validate_rejects_negative_columns() {
        let doc = ReportDocument {
            pages: vec![page_with(1, vec![]).with_columns(-1)],
            ..Default::default()
        };
        assert!(matches!(doc.validate(), Err(ReportError::MalformedDocument(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let doc = ReportDocument {
            pages: vec![page_with(0, vec![]), page_with(0, vec![])],
            ..Default::default()
        };
        assert!(matches!(doc.validate(), Err(ReportError::MalformedDocument(_))));
    }

    #[test]
    fn test_source_prefers_embedded_data() {
        let mut photo = PhotoRef::from_url("./a.jpg", "");
        assert_eq!(photo.source(), Some(PhotoSource::Locator("./a.jpg")));
        photo.data = Some("iVBOR".to_string());
        assert_eq!(photo.source(), Some(PhotoSource::Embedded("iVBOR")));
        photo.data = Some("   ".to_string());
        assert_eq!(photo.source(), Some(PhotoSource::Locator("./a.jpg")));
        photo.url = None;
        assert_eq!(photo.source(), None);
    }

    #[test]
    fn test_deserialize_builder_json() {
        let json = r#"{
            "name": "Vistoria",
            "details": { "clientName": "Acme", "crea": "1234567" },
            "pages": [{
                "id": "1",
                "title": "Quadro",
                "content": "",
                "order": 0,
                "photos": [{ "url": "./q.jpg", "subtitle": "Disjuntor", "lastModified": "2025-03-01T10:00:00Z" }],
                "layout": { "columns": 1, "photoOrder": [] }
            }]
        }"#;
        let doc: ReportDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.details.client_name, "Acme");
        assert_eq!(doc.details.engineer, "");
        assert_eq!(doc.pages[0].layout.columns, 1);
        assert_eq!(doc.pages[0].photos[0].subtitle, "Disjuntor");
        assert!(doc.pages[0].photos[0].last_modified.is_some());
    }

    #[test]
    fn test_last_modified_is_lenient() {
        let photo: PhotoRef =
            serde_json::from_str(r#"{"url": "./a.jpg", "lastModified": 1700000000000}"#).unwrap();
        assert_eq!(photo.last_modified.map(|at| at.timestamp()), Some(1_700_000_000));

        let photo: PhotoRef =
            serde_json::from_str(r#"{"url": "./a.jpg", "lastModified": "ontem"}"#).unwrap();
        assert!(photo.last_modified.is_none());

        let photo: PhotoRef =
            serde_json::from_str(r#"{"url": "./a.jpg", "lastModified": null}"#).unwrap();
        assert!(photo.last_modified.is_none());

        let photo: PhotoRef = serde_json::from_str(r#"{"url": "./a.jpg"}"#).unwrap();
        assert!(photo.last_modified.is_none());
    }

    #[test]
    fn test_pages_must_be_a_sequence() {
        let result = serde_json::from_str::<ReportDocument>(r#"{"name": "x", "pages": 3}"#);
        assert!(result.is_err());
    }
}
