//! Page geometry and static font-metric tables for the résumé template.
//!
//! The template prints with two non-embedded Adobe-Japan1 CID fonts: a Mincho
//! face for body text and a Gothic face for labels and headings. Both are
//! monospaced per character class: half-width glyphs (ASCII, Latin, half-width
//! kana) advance 0.5 em and everything else advances a full 1 em. Treating
//! every non-Latin character as full width over-estimates some punctuation,
//! which only ever wraps a line early, never late.
//!
//! All lengths are PDF points (1/72 in).

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    /// Body text and table cells.
    Mincho,
    /// Title, headings, labels and table headers.
    Gothic,
}

impl FontFace {
    /// PostScript name of the CID font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Mincho => "HeiseiMin-W3",
            FontFace::Gothic => "HeiseiKakuGo-W5",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Mincho => "F1",
            FontFace::Gothic => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Geometry and typography of the single fixed template.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Same margin on all four sides.
    pub margin_pt: f32,

    pub title_size_pt: f32,
    pub title_gap_pt: f32,
    pub section_title_size_pt: f32,
    /// Space between a heading's text and its underline.
    pub heading_padding_pt: f32,
    /// Space between the underline and the section body.
    pub heading_gap_pt: f32,
    pub section_gap_pt: f32,

    pub body_size_pt: f32,
    pub line_height: f32,
    pub label_width_pt: f32,
    pub field_row_gap_pt: f32,

    pub cell_size_pt: f32,
    pub cell_padding_pt: f32,
    /// Fixed proportions of the content width; must sum to 1.0.
    pub column_fractions: [f32; 3],

    pub text_block_size_pt: f32,
    pub text_block_line_height: f32,
    pub text_block_padding_pt: f32,
    pub text_block_min_height_pt: f32,

    pub footer_size_pt: f32,
}

/// A4 portrait, 20pt margins, 10pt body / 9pt tables.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_pt: 595.28,
        page_height_pt: 841.89,
        margin_pt: 20.0,
        title_size_pt: 16.0,
        title_gap_pt: 20.0,
        section_title_size_pt: 12.0,
        heading_padding_pt: 2.0,
        heading_gap_pt: 8.0,
        section_gap_pt: 15.0,
        body_size_pt: 10.0,
        line_height: 1.2,
        label_width_pt: 80.0,
        field_row_gap_pt: 4.0,
        cell_size_pt: 9.0,
        cell_padding_pt: 4.0,
        column_fractions: [0.25, 0.50, 0.25],
        text_block_size_pt: 9.0,
        text_block_line_height: 1.4,
        text_block_padding_pt: 8.0,
        text_block_min_height_pt: 60.0,
        footer_size_pt: 8.0,
    }
}

impl PageConfig {
    pub fn content_width(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    /// Lowest y (from the page top) an item may reach.
    pub fn content_bottom(&self) -> f32 {
        self.page_height_pt - self.margin_pt
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.margin_pt
    }

    pub fn column_widths(&self) -> [f32; 3] {
        let width = self.content_width();
        self.column_fractions.map(|fraction| width * fraction)
    }

    pub fn title_line_pt(&self) -> f32 {
        self.title_size_pt * self.line_height
    }

    pub fn heading_line_pt(&self) -> f32 {
        self.section_title_size_pt * self.line_height
    }

    pub fn body_line_pt(&self) -> f32 {
        self.body_size_pt * self.line_height
    }

    pub fn cell_line_pt(&self) -> f32 {
        self.cell_size_pt * self.line_height
    }

    pub fn text_block_line_pt(&self) -> f32 {
        self.text_block_size_pt * self.text_block_line_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Advance widths of one face, in em units.
pub struct FontMetricTable {
    pub halfwidth_em: f32,
    pub fullwidth_em: f32,
    /// Baseline offset below the top of a line box.
    pub ascent_em: f32,
}

impl FontMetricTable {
    pub fn char_width_em(&self, c: char) -> f32 {
        if c.is_control() {
            0.0
        } else if is_halfwidth(c) {
            self.halfwidth_em
        } else {
            self.fullwidth_em
        }
    }

    /// Rendered width of `s` in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width_em(c)).sum()
    }

    /// Rendered width of `s` in points at `size_pt`.
    pub fn width_pt(&self, s: &str, size_pt: f32) -> f32 {
        self.measure_str(s) * size_pt
    }

    pub fn space_width_em(&self) -> f32 {
        self.halfwidth_em
    }
}

/// ASCII, Latin-1/Latin Extended and half-width katakana.
pub fn is_halfwidth(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0x24F | 0xFF61..=0xFF9F)
}

/// Characters that may end a line on either side without a space, i.e.
/// everything that is not half-width (CJK ideographs, kana, full-width forms).
pub fn allows_break_around(c: char) -> bool {
    !is_halfwidth(c) && !c.is_whitespace() && !c.is_control()
}

static MINCHO_TABLE: FontMetricTable = FontMetricTable {
    halfwidth_em: 0.5,
    fullwidth_em: 1.0,
    ascent_em: 0.88,
};

static GOTHIC_TABLE: FontMetricTable = FontMetricTable {
    halfwidth_em: 0.5,
    fullwidth_em: 1.0,
    ascent_em: 0.88,
};

pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Mincho => &MINCHO_TABLE,
        FontFace::Gothic => &GOTHIC_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
