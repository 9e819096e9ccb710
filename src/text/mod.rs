//! # Text Layout
//!
//! Greedy word wrapping and measurement for boxed text.
//!
//! Break opportunities come from UAX#14, but only two kinds are honoured:
//! mandatory breaks (newlines) and breaks after ordinary whitespace. Words
//! are never split inside, so "pré-moldado" stays on one line and a
//! no-break space keeps its neighbours together. A word wider than the box
//! gets a line of its own and is allowed to overflow it.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontContext, StandardFont};

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width` where possible.
    ///
    /// Blank input produces no lines at all, so callers can skip drawing a
    /// box entirely. Text that already fits comes back as a single line
    /// equal to the input.
    pub fn wrap(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font: StandardFont,
        font_size: f64,
    ) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let fits = |candidate: &str| {
            font_context.measure_string(candidate.trim_end(), font, font_size) <= max_width
        };

        let mut lines = Vec::new();
        let mut current = String::new();

        for (word, hard_break) in words(text) {
            if current.trim().is_empty() {
                current.push_str(word);
            } else {
                let candidate = format!("{}{}", current, word);
                if fits(&candidate) {
                    current = candidate;
                } else {
                    lines.push(current.trim_end().to_string());
                    current = word.to_string();
                }
            }

            if hard_break {
                lines.push(current.trim_end().to_string());
                current.clear();
            }
        }

        if !current.trim().is_empty() {
            lines.push(current.trim_end().to_string());
        }

        lines
    }

    /// Rendered width of a single line in points.
    pub fn measure_width(
        &self,
        font_context: &FontContext,
        line: &str,
        font: StandardFont,
        font_size: f64,
    ) -> f64 {
        font_context.measure_string(line, font, font_size)
    }
}

/// X offset that centres a line of `line_width` inside `containing_width`:
/// `offset + line_width / 2 == containing_width / 2`.
pub fn centered_offset(line_width: f64, containing_width: f64) -> f64 {
    (containing_width - line_width) / 2.0
}

/// Split text into words, each carrying its trailing whitespace, paired with
/// whether a mandatory break follows. Line terminators are stripped.
fn words(text: &str) -> Vec<(&str, bool)> {
    let mut result = Vec::new();
    let mut start = 0;

    for (idx, opportunity) in linebreaks(text) {
        let mandatory = matches!(opportunity, BreakOpportunity::Mandatory);
        let after_space = text[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_whitespace() && c != '\u{00A0}');

        if mandatory || after_space {
            let word = text[start..idx].trim_end_matches(is_line_terminator);
            result.push((word, mandatory));
            start = idx;
        }
    }

    result
}

fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}
