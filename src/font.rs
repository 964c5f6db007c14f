//! Advance widths for the two base-14 faces the catalog draws with.
//!
//! Widths are the Adobe AFM values in 1/1000 em for the printable ASCII
//! range. Anything outside that range measures as a digit.

use crate::types::Pt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseFont {
    Helvetica,
    HelveticaBold,
}

impl BaseFont {
    pub fn for_weight(bold: bool) -> Self {
        if bold {
            BaseFont::HelveticaBold
        } else {
            BaseFont::Helvetica
        }
    }

    pub fn postscript_name(self) -> &'static str {
        match self {
            BaseFont::Helvetica => "Helvetica",
            BaseFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used inside page content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            BaseFont::Helvetica => "F1",
            BaseFont::HelveticaBold => "F2",
        }
    }

    pub fn from_postscript_name(name: &str) -> Option<Self> {
        match name {
            "Helvetica" => Some(BaseFont::Helvetica),
            "Helvetica-Bold" => Some(BaseFont::HelveticaBold),
            _ => None,
        }
    }

    fn advance(self, ch: char) -> u16 {
        let table = match self {
            BaseFont::Helvetica => &HELVETICA_WIDTHS,
            BaseFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        let code = ch as u32;
        if (32..=126).contains(&code) {
            table[(code - 32) as usize]
        } else {
            FALLBACK_ADVANCE
        }
    }

    pub fn string_width(self, font_size: Pt, text: &str) -> Pt {
        let units: i64 = text.chars().map(|ch| i64::from(self.advance(ch))).sum();
        Pt::from_milli(font_size.to_milli().saturating_mul(units) / 1000)
    }
}

const FALLBACK_ADVANCE: u16 = 556;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
