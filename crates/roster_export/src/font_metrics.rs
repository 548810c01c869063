//! Glyph widths for the two standard fonts the PDF writer uses, plus the
//! WinAnsi encoding those fonts are declared with.
//!
//! Widths are in 1/1000 em, taken from the Adobe core font metrics for
//! printable ASCII. Anything else uses an average width.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name used in content streams.
    pub fn resource(self) -> &'static str {
        match self {
            Font::Bold => "F1",
            Font::Regular => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Bold => "Helvetica-Bold",
            Font::Regular => "Helvetica",
        }
    }
}

// Code points 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

fn glyph_width(byte: u8, font: Font) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    match byte {
        32..=126 => table[(byte - 32) as usize],
        0xA0 => 278,
        _ => FALLBACK_WIDTH,
    }
}

/// Width of one character in points when set in `font` at `size`.
pub fn char_width(c: char, font: Font, size: f64) -> f64 {
    f64::from(glyph_width(win_ansi_byte(c), font)) * size / 1000.0
}

/// Width of `text` in points when set in `font` at `size`.
pub fn text_width(text: &str, font: Font, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| u32::from(glyph_width(win_ansi_byte(c), font)))
        .sum();
    f64::from(units) * size / 1000.0
}

/// WinAnsiEncoding byte for `c`; `?` when the character has no slot.
pub fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => code as u8,
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}
