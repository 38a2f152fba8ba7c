//! PDF encoding of a laid-out `Document` with `lopdf`.
//!
//! Text uses two non-embedded Adobe-Japan1 CID fonts addressed through the
//! `UniJIS-UCS2-H` CMap, so every string is written as big-endian UCS-2.
//! Characters outside the BMP have no UCS-2 code and print as `〓`.
//!
//! Coordinates in the layout run down from the page top; PDF user space runs
//! up from the bottom, so every y is flipped against the page height.

use anyhow::{Context, Result};
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream, StringFormat};

use crate::layout::font_metrics::{get_metrics, FontFace, PageConfig};
use crate::layout::{Document, ItemKind, PlacedItem, SectionKind};

/// Printed for characters the UCS-2 CMap cannot address.
const GETA_MARK: u16 = 0x3013;
const PRODUCER: &str = "resume";
const TITLE: &str = "履歴書";
const CONTINUED_SUFFIX: &str = "（続き）";
const LABEL_SUFFIX: &str = "：";
const RULE_WIDTH: f32 = 0.5;
const HEADER_FILL_GRAY: f32 = 0.92;

pub fn encode_pdf(document: &Document, config: &PageConfig) -> Result<Vec<u8>> {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let fonts = dictionary! {
        FontFace::Mincho.resource_name() => add_cid_font(&mut pdf, FontFace::Mincho),
        FontFace::Gothic.resource_name() => add_cid_font(&mut pdf, FontFace::Gothic),
    };
    let resources_id = pdf.add_object(dictionary! { "Font" => fonts });

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        real(config.page_width_pt),
        real(config.page_height_pt),
    ];

    let total = document.pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for page in &document.pages {
        let mut painter = Painter::new(config);
        for item in &page.items {
            painter.item(item);
        }
        painter.footer(page.number, total);

        let content = Content {
            operations: painter.operations,
        };
        let encoded = content
            .encode()
            .with_context(|| format!("Failed to encode content stream of page {}", page.number))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(total as i64),
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf.add_object(dictionary! {
        "Title" => pdf_text_string(TITLE),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);

    pdf.compress();
    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes).context("Failed to serialize PDF")?;
    Ok(bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Fonts
// ────────────────────────────────────────────────────────────────────────────

fn add_cid_font(pdf: &mut lopdf::Document, face: FontFace) -> ObjectId {
    let flags = match face {
        FontFace::Mincho => 6, // symbolic + serif
        FontFace::Gothic => 4,
    };
    let descriptor_id = pdf.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => face.base_font(),
        "Flags" => Object::Integer(flags),
        "FontBBox" => vec![
            Object::Integer(-170),
            Object::Integer(-331),
            Object::Integer(1024),
            Object::Integer(903),
        ],
        "ItalicAngle" => Object::Integer(0),
        "Ascent" => Object::Integer(859),
        "Descent" => Object::Integer(-141),
        "CapHeight" => Object::Integer(709),
        "StemV" => Object::Integer(69),
    });

    let cid_font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => face.base_font(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Japan1"),
            "Supplement" => Object::Integer(2),
        },
        "FontDescriptor" => descriptor_id,
        "DW" => Object::Integer(1000),
        // Proportional ASCII and half-width katakana CIDs advance half an em.
        "W" => vec![
            Object::Integer(1),
            Object::Integer(95),
            Object::Integer(500),
            Object::Integer(231),
            Object::Integer(632),
            Object::Integer(500),
        ],
    });

    pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => face.base_font(),
        "Encoding" => "UniJIS-UCS2-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Text encoding
// ────────────────────────────────────────────────────────────────────────────

/// Big-endian UCS-2 code units for the CID CMap. Control characters are
/// dropped since they have no glyph and no width in the layout.
pub fn ucs2_bytes(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for c in text.chars().filter(|c| !c.is_control()) {
        let unit = u16::try_from(c as u32).unwrap_or(GETA_MARK);
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// UTF-16BE with byte-order mark, for document-level strings such as Title.
fn pdf_text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

// ────────────────────────────────────────────────────────────────────────────
// Painter
// ────────────────────────────────────────────────────────────────────────────

/// Accumulates content-stream operations for one page.
struct Painter<'a> {
    config: &'a PageConfig,
    operations: Vec<Operation>,
}

impl<'a> Painter<'a> {
    fn new(config: &'a PageConfig) -> Self {
        let operations = vec![
            Operation::new("w", vec![real(RULE_WIDTH)]),
            Operation::new("G", vec![real(0.0)]),
        ];
        Self { config, operations }
    }

    fn item(&mut self, item: &PlacedItem) {
        let config = self.config;
        let left = config.margin_pt;
        match &item.kind {
            ItemKind::Title { text } => {
                let size = config.title_size_pt;
                let width = get_metrics(FontFace::Gothic).width_pt(text, size);
                let x = (config.page_width_pt - width) / 2.0;
                self.text(FontFace::Gothic, size, x, item.top, item.height, text);
            }
            ItemKind::SectionHeading { section, continued } => {
                self.heading(*section, *continued, item);
            }
            ItemKind::FieldRow { label, value } => {
                let size = config.body_size_pt;
                let line = config.body_line_pt();
                let label = format!("{label}{LABEL_SUFFIX}");
                self.text(FontFace::Gothic, size, left, item.top, line, &label);
                let x = left + config.label_width_pt;
                for (i, text) in value.iter().enumerate() {
                    self.text(FontFace::Mincho, size, x, item.top + i as f32 * line, line, text);
                }
            }
            ItemKind::TableHeader { cells, .. } => {
                let columns: Vec<Vec<String>> = cells.iter().map(|c| vec![c.clone()]).collect();
                self.table_row(item, &columns, FontFace::Gothic, true);
            }
            ItemKind::TableRow { cells, .. } => {
                self.table_row(item, cells, FontFace::Mincho, false);
            }
            ItemKind::TextBlock { lines, .. } => {
                self.rect(left, item.top, config.content_width(), item.height, false);
                let size = config.text_block_size_pt;
                let line = config.text_block_line_pt();
                let x = left + config.text_block_padding_pt;
                let top = item.top + config.text_block_padding_pt;
                for (i, text) in lines.iter().enumerate() {
                    self.text(FontFace::Mincho, size, x, top + i as f32 * line, line, text);
                }
            }
        }
    }

    fn heading(&mut self, section: SectionKind, continued: bool, item: &PlacedItem) {
        let config = self.config;
        let title = if continued {
            format!("{}{CONTINUED_SUFFIX}", section.title())
        } else {
            section.title().to_string()
        };
        self.text(
            FontFace::Gothic,
            config.section_title_size_pt,
            config.margin_pt,
            item.top,
            config.heading_line_pt(),
            &title,
        );
        let y = self.flip(item.bottom());
        self.operations.extend([
            Operation::new("m", vec![real(config.margin_pt), real(y)]),
            Operation::new(
                "l",
                vec![real(config.page_width_pt - config.margin_pt), real(y)],
            ),
            Operation::new("S", vec![]),
        ]);
    }

    fn table_row(
        &mut self,
        item: &PlacedItem,
        cells: &[Vec<String>],
        face: FontFace,
        shaded: bool,
    ) {
        let config = self.config;
        let size = config.cell_size_pt;
        let line = config.cell_line_pt();
        let mut x = config.margin_pt;
        for (width, lines) in config.column_widths().into_iter().zip(cells) {
            self.rect(x, item.top, width, item.height, shaded);
            let top = item.top + config.cell_padding_pt;
            for (i, text) in lines.iter().enumerate() {
                let tx = x + config.cell_padding_pt;
                self.text(face, size, tx, top + i as f32 * line, line, text);
            }
            x += width;
        }
    }

    fn footer(&mut self, number: usize, total: usize) {
        let config = self.config;
        let size = config.footer_size_pt;
        let text = format!("{number} / {total}");
        let width = get_metrics(FontFace::Mincho).width_pt(&text, size);
        let x = (config.page_width_pt - width) / 2.0;
        // Centered in the bottom margin.
        let top = config.content_bottom() + (config.margin_pt - size) / 2.0;
        self.text(FontFace::Mincho, size, x, top, size, &text);
    }

    // ── primitives ─────────────────────────────────────────────────────────

    fn flip(&self, y_from_top: f32) -> f32 {
        self.config.page_height_pt - y_from_top
    }

    /// Draws one line of text vertically centered in a line box starting at
    /// `line_top`.
    fn text(
        &mut self,
        face: FontFace,
        size: f32,
        x: f32,
        line_top: f32,
        line_height: f32,
        text: &str,
    ) {
        if text.is_empty() {
            return;
        }
        let ascent = get_metrics(face).ascent_em * size;
        let baseline = line_top + (line_height - size) / 2.0 + ascent;
        let y = self.flip(baseline);
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![face.resource_name().into(), real(size)]),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(ucs2_bytes(text), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rect(&mut self, x: f32, top: f32, width: f32, height: f32, shaded: bool) {
        let y = self.flip(top + height);
        let bounds = vec![real(x), real(y), real(width), real(height)];
        if shaded {
            self.operations.extend([
                Operation::new("q", vec![]),
                Operation::new("g", vec![real(HEADER_FILL_GRAY)]),
                Operation::new("re", bounds),
                Operation::new("B", vec![]),
                Operation::new("Q", vec![]),
            ]);
        } else {
            self.operations.extend([
                Operation::new("re", bounds),
                Operation::new("S", vec![]),
            ]);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
