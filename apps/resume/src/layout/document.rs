//! Laid-out document: pages of positioned items, ready for encoding.

/// The six sections of the template, in print order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    PersonalInfo,
    Education,
    WorkExperience,
    Qualifications,
    Motivation,
    SelfPr,
}

impl SectionKind {
    pub fn title(self) -> &'static str {
        match self {
            SectionKind::PersonalInfo => "個人情報",
            SectionKind::Education => "学歴",
            SectionKind::WorkExperience => "職歴",
            SectionKind::Qualifications => "資格・免許",
            SectionKind::Motivation => "志望動機",
            SectionKind::SelfPr => "自己PR",
        }
    }
}

pub const SECTION_ORDER: [SectionKind; 6] = [
    SectionKind::PersonalInfo,
    SectionKind::Education,
    SectionKind::WorkExperience,
    SectionKind::Qualifications,
    SectionKind::Motivation,
    SectionKind::SelfPr,
];

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Title {
        text: String,
    },
    /// `continued` marks a heading re-emitted at the top of a later page.
    SectionHeading {
        section: SectionKind,
        continued: bool,
    },
    FieldRow {
        label: String,
        value: Vec<String>,
    },
    TableHeader {
        section: SectionKind,
        cells: Vec<String>,
    },
    /// One data row; `cells` holds the wrapped lines of each column.
    TableRow {
        section: SectionKind,
        index: usize,
        cells: Vec<Vec<String>>,
    },
    /// A bordered free-text block, or one page's fragment of it.
    TextBlock {
        section: SectionKind,
        lines: Vec<String>,
        continued: bool,
    },
}

/// An item with its vertical extent, measured in points from the page top.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    pub top: f32,
    pub height: f32,
    pub kind: ItemKind,
}

impl PlacedItem {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub items: Vec<PlacedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

// Inspection helpers for layout tests.
#[cfg(test)]
impl Document {
    /// Table rows of `section` across all pages, in print order.
    pub fn rows(&self, section: SectionKind) -> Vec<(usize, &[Vec<String>])> {
        self.items()
            .filter_map(|item| match &item.kind {
                ItemKind::TableRow {
                    section: s,
                    index,
                    cells,
                } if *s == section => Some((*index, cells.as_slice())),
                _ => None,
            })
            .collect()
    }

    /// Value of the personal-information row labelled `label`, lines joined.
    pub fn field(&self, label: &str) -> Option<String> {
        self.items().find_map(|item| match &item.kind {
            ItemKind::FieldRow { label: l, value } if l == label => Some(value.join("\n")),
            _ => None,
        })
    }

    /// Full text of a text-block section, fragments and lines joined.
    pub fn text_block(&self, section: SectionKind) -> Vec<String> {
        self.items()
            .filter_map(|item| match &item.kind {
                ItemKind::TextBlock {
                    section: s, lines, ..
                } if *s == section => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// First-occurrence order of section headings.
    pub fn section_order(&self) -> Vec<SectionKind> {
        let mut order = Vec::new();
        for item in self.items() {
            if let ItemKind::SectionHeading { section, .. } = item.kind {
                if !order.contains(&section) {
                    order.push(section);
                }
            }
        }
        order
    }

    /// Every placed item across all pages, in print order.
    pub fn items(&self) -> impl Iterator<Item = &PlacedItem> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }
}
