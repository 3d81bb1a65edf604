//! Inline markup for extracted passages.

mod consolidate;
mod formatter;

pub use consolidate::{consolidate, merge_font_spans, remove_tag_seams};
pub use formatter::{InlineFormatter, DEFAULT_BODY_FONT, LINE_BREAK};
