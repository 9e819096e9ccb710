//! Structured error types for the report engine.
//!
//! Document-level failures are fatal and surface as [`ReportError`].
//! Photo-level failures ([`crate::image_loader::ImageError`]) are absorbed by
//! the renderer unless they signal resource exhaustion.

use thiserror::Error;

use crate::image_loader::ImageError;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse as a report document.
    #[error("Failed to parse report: {source}{}", hint_suffix(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// The document parsed but violates its structural contract.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    /// Decode buffers for a page could not be allocated.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
    /// The caller aborted assembly before it completed.
    #[error("Report generation was cancelled")]
    Cancelled,
    /// The output backend failed.
    #[error("Render error: {0}")]
    RenderError(String),
    /// A layout configuration file could not be read.
    #[error("Invalid layout configuration: {0}")]
    Config(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report schema. `pages` must be an array and every page needs an `id`.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input; is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ReportError::ParseError { source: e, hint }
    }
}

impl From<ImageError> for ReportError {
    /// Only exhaustion reaches this conversion in practice; recoverable
    /// image errors are turned into placeholders before they can propagate.
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::ResourceExhausted(msg) => ReportError::ResourceExhausted(msg),
            other => ReportError::RenderError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: ReportError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse report"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_exhaustion_maps_to_fatal_variant() {
        let err: ReportError = ImageError::ResourceExhausted("4 GiB".to_string()).into();
        assert!(matches!(err, ReportError::ResourceExhausted(_)));
    }
}
