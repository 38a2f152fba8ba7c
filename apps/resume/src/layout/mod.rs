// Document layout: compose the fixed résumé template, wrap text with static
// font metrics, and paginate onto A4 pages.
// Pure and CPU-bound; callers on the async runtime run it inside
// tokio::task::spawn_blocking.

pub mod compose;
pub mod document;
pub mod font_metrics;
pub mod paginate;
pub mod wrap;

pub use document::{Document, ItemKind, Page, PlacedItem, SectionKind};
pub use font_metrics::{default_page_config, FontFace, PageConfig};

use crate::models::resume::ResumeData;

/// Lays out `data` into pages. Same data and config give the same document.
pub fn layout_resume(data: &ResumeData, config: &PageConfig) -> Document {
    let template = compose::compose(data);
    paginate::paginate(&template, config)
}
