//! Pagination: places composed sections onto fixed-height pages.
//!
//! Rules:
//! - a heading always travels with the first piece of its body (keep-with-next)
//! - table rows and field rows are never split; a row that does not fit moves
//!   to a new page, where the heading (continued) and table header repeat
//! - text blocks may continue across pages line by line
//! - a row taller than a whole page is placed alone and logged, never dropped

use tracing::warn;

use crate::layout::compose::{Section, SectionBody, Template};
use crate::layout::document::{Document, ItemKind, Page, PlacedItem, SectionKind};
use crate::layout::font_metrics::{get_metrics, FontFace, PageConfig};
use crate::layout::wrap::wrap_text;

/// Slack for float accumulation when comparing against the page bottom.
const FIT_EPSILON: f32 = 0.01;

pub fn paginate(template: &Template, config: &PageConfig) -> Document {
    let mut paginator = Paginator::new(config);

    let title_height = config.title_line_pt();
    paginator.place(
        title_height,
        ItemKind::Title {
            text: template.title.to_string(),
        },
    );
    paginator.advance(config.title_gap_pt);

    for section in &template.sections {
        paginator.place_section(section);
        paginator.advance(config.section_gap_pt);
    }

    paginator.finish()
}

// ────────────────────────────────────────────────────────────────────────────
// Measured pieces
// ────────────────────────────────────────────────────────────────────────────

struct MeasuredRow {
    height: f32,
    kind: ItemKind,
}

// ────────────────────────────────────────────────────────────────────────────
// Paginator
// ────────────────────────────────────────────────────────────────────────────

struct Paginator<'a> {
    config: &'a PageConfig,
    pages: Vec<Page>,
    items: Vec<PlacedItem>,
    cursor: f32,
}

impl<'a> Paginator<'a> {
    fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            items: Vec::new(),
            cursor: config.margin_pt,
        }
    }

    fn finish(mut self) -> Document {
        self.flush_page();
        Document { pages: self.pages }
    }

    // ── cursor primitives ──────────────────────────────────────────────────

    fn remaining(&self) -> f32 {
        self.config.content_bottom() - self.cursor
    }

    fn fits(&self, height: f32) -> bool {
        height <= self.remaining() + FIT_EPSILON
    }

    fn page_is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn place(&mut self, height: f32, kind: ItemKind) {
        self.items.push(PlacedItem {
            top: self.cursor,
            height,
            kind,
        });
        self.cursor += height;
    }

    fn advance(&mut self, gap: f32) {
        self.cursor += gap;
    }

    fn flush_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            items: std::mem::take(&mut self.items),
        });
        self.cursor = self.config.margin_pt;
    }

    fn new_page(&mut self) {
        if !self.page_is_empty() {
            self.flush_page();
        }
    }

    // ── headings ───────────────────────────────────────────────────────────

    /// Heading box plus the gap below its underline.
    fn heading_extent(&self) -> f32 {
        self.config.heading_line_pt() + self.config.heading_padding_pt + self.config.heading_gap_pt
    }

    fn place_heading(&mut self, section: SectionKind, continued: bool) {
        let height = self.config.heading_line_pt() + self.config.heading_padding_pt;
        self.place(height, ItemKind::SectionHeading { section, continued });
        self.advance(self.config.heading_gap_pt);
    }

    /// Starts a section on a new page unless `lead` (the heading's first
    /// companion) fits below the heading here.
    fn keep_with_next(&mut self, lead: f32) {
        if !self.page_is_empty() && !self.fits(self.heading_extent() + lead) {
            self.new_page();
        }
    }

    // ── sections ───────────────────────────────────────────────────────────

    fn place_section(&mut self, section: &Section) {
        match &section.body {
            SectionBody::Fields(fields) => self.place_fields(section.kind, fields),
            SectionBody::Table { header, rows } => self.place_table(section.kind, header, rows),
            SectionBody::Text(text) => self.place_text_block(section.kind, text),
        }
    }

    fn place_fields(&mut self, section: SectionKind, fields: &[(&'static str, String)]) {
        let rows: Vec<MeasuredRow> = fields
            .iter()
            .map(|(label, value)| self.measure_field(label, value))
            .collect();

        self.keep_with_next(rows.first().map_or(0.0, |row| row.height));
        self.place_heading(section, false);

        for (index, row) in rows.into_iter().enumerate() {
            // The first row stays under its heading even when it overflows.
            if index > 0 && !self.fits(row.height) {
                self.new_page();
                self.place_heading(section, true);
            }
            self.warn_if_oversized(section, row.height);
            self.place(row.height, row.kind);
            self.advance(self.config.field_row_gap_pt);
        }
    }

    fn place_table(
        &mut self,
        section: SectionKind,
        header: &[&'static str; 3],
        rows: &[[String; 3]],
    ) {
        let header = self.measure_header(section, header);
        let measured: Vec<MeasuredRow> = rows
            .iter()
            .enumerate()
            .map(|(index, cells)| self.measure_table_row(section, index, cells))
            .collect();

        let first_row = measured.first().map_or(0.0, |row| row.height);
        self.keep_with_next(header.height + first_row);
        self.place_heading(section, false);
        self.place(header.height, header.kind.clone());

        for (index, row) in measured.into_iter().enumerate() {
            // Breaking before the first row would strand the heading and header.
            if index > 0 && !self.fits(row.height) {
                self.new_page();
                self.place_heading(section, true);
                self.place(header.height, header.kind.clone());
            }
            self.warn_if_oversized(section, row.height);
            self.place(row.height, row.kind);
        }
    }

    fn place_text_block(&mut self, section: SectionKind, text: &str) {
        let config = self.config;
        let padding = 2.0 * config.text_block_padding_pt;
        let line_pt = config.text_block_line_pt();
        let width = config.content_width() - padding;
        let metrics = get_metrics(FontFace::Mincho);
        let lines = wrap_text(text, width, config.text_block_size_pt, metrics);
        let whole = (lines.len() as f32 * line_pt + padding).max(config.text_block_min_height_pt);

        // The heading needs the whole block, or at least one line of it.
        let lead = whole.min(padding + line_pt);
        self.keep_with_next(lead);
        self.place_heading(section, false);

        if self.fits(whole) {
            self.place(
                whole,
                ItemKind::TextBlock {
                    section,
                    lines,
                    continued: false,
                },
            );
            return;
        }

        let mut rest = lines.as_slice();
        let mut continued = false;
        loop {
            let capacity = ((self.remaining() - padding + FIT_EPSILON) / line_pt).floor();
            let capacity = if capacity < 1.0 {
                if !self.page_is_empty_below_heading() {
                    self.new_page();
                    self.place_heading(section, true);
                    continue;
                }
                warn!(section = ?section, "Text block line taller than page; placing anyway");
                1
            } else {
                capacity as usize
            };

            let take = capacity.min(rest.len());
            let (fragment, tail) = rest.split_at(take);
            let height = fragment.len() as f32 * line_pt + padding;
            self.place(
                height,
                ItemKind::TextBlock {
                    section,
                    lines: fragment.to_vec(),
                    continued,
                },
            );
            rest = tail;
            if rest.is_empty() {
                break;
            }
            continued = true;
            self.new_page();
            self.place_heading(section, true);
        }
    }

    /// True when the only thing on the current page is a continued heading.
    fn page_is_empty_below_heading(&self) -> bool {
        matches!(
            self.items.as_slice(),
            [PlacedItem {
                kind: ItemKind::SectionHeading { .. },
                ..
            }]
        )
    }

    fn warn_if_oversized(&self, section: SectionKind, height: f32) {
        if !self.fits(height) {
            warn!(
                section = ?section,
                row_height = height,
                page_height = self.config.content_height(),
                "Row taller than a page; it will overflow the bottom margin"
            );
        }
    }

    // ── measurement ────────────────────────────────────────────────────────

    fn measure_field(&self, label: &str, value: &str) -> MeasuredRow {
        let config = self.config;
        let width = config.content_width() - config.label_width_pt;
        let value = wrap_text(value, width, config.body_size_pt, get_metrics(FontFace::Mincho));
        let height = value.len().max(1) as f32 * config.body_line_pt();
        MeasuredRow {
            height,
            kind: ItemKind::FieldRow {
                label: label.to_string(),
                value,
            },
        }
    }

    fn measure_header(&self, section: SectionKind, header: &[&'static str; 3]) -> MeasuredRow {
        let config = self.config;
        let metrics = get_metrics(FontFace::Gothic);
        let widths = config.column_widths();
        let lines = header
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let usable = width - 2.0 * config.cell_padding_pt;
                wrap_text(cell, usable, config.cell_size_pt, metrics).len()
            })
            .max()
            .unwrap_or(1)
            .max(1);
        MeasuredRow {
            height: lines as f32 * config.cell_line_pt() + 2.0 * config.cell_padding_pt,
            kind: ItemKind::TableHeader {
                section,
                cells: header.iter().map(|cell| cell.to_string()).collect(),
            },
        }
    }

    fn measure_table_row(
        &self,
        section: SectionKind,
        index: usize,
        cells: &[String; 3],
    ) -> MeasuredRow {
        let config = self.config;
        let metrics = get_metrics(FontFace::Mincho);
        let widths = config.column_widths();
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                wrap_text(cell, width - 2.0 * config.cell_padding_pt, config.cell_size_pt, metrics)
            })
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        MeasuredRow {
            height: lines as f32 * config.cell_line_pt() + 2.0 * config.cell_padding_pt,
            kind: ItemKind::TableRow {
                section,
                index,
                cells,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
