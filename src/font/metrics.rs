//! Advance widths for the standard PDF fonts the engine draws with.
//!
//! Values are the Adobe AFM widths in 1/1000 em for the printable ASCII
//! range. Latin-1 letters with diacritics share the width of their base
//! letter in both faces, which covers the Portuguese text reports carry.

/// Helvetica, code points 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Helvetica-Bold, code points 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// Width table for one standard font face.
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
    bold: bool,
}

pub(super) static HELVETICA_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA,
    bold: false,
};

pub(super) static HELVETICA_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD,
    bold: true,
};

impl StandardFontMetrics {
    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        if let Some(base) = fold_diacritic(ch) {
            return self.advance(base);
        }
        self.latin1_symbol(ch).unwrap_or(556)
    }

    /// Width of a single character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    fn latin1_symbol(&self, ch: char) -> Option<u16> {
        let w = match ch {
            '\u{00A0}' => 278, // no-break space
            '\u{00A7}' => 556, // section
            '\u{00A9}' => 737, // copyright
            '\u{00AA}' => 370, // ordfeminine
            '\u{00AB}' | '\u{00BB}' => 556,
            '\u{00B0}' => 400, // degree
            '\u{00B7}' => 278, // middle dot
            '\u{00BA}' => 365, // ordmasculine
            '\u{00C6}' => 1000,
            '\u{00E6}' => 889,
            '\u{00DF}' => 611,
            '\u{2013}' => 556, // en dash
            '\u{2014}' => 1000,
            '\u{2018}' | '\u{2019}' => if self.bold { 278 } else { 222 },
            '\u{201C}' | '\u{201D}' => if self.bold { 500 } else { 333 },
            '\u{2022}' => 350,
            '\u{2026}' => 1000,
            '\u{20AC}' => 556,
            _ => return None,
        };
        Some(w)
    }
}

/// Map a Latin-1 letter with a diacritic to its base letter.
fn fold_diacritic(ch: char) -> Option<char> {
    let base = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'Ç' => 'C',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ñ' => 'N',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ý' => 'Y',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}
