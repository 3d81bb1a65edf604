//! Document model types.
//!
//! A [`Document`] is an ordered list of top-level [`Paragraph`]s, each an
//! ordered list of styled [`TextRun`]s. Extraction turns documents into
//! [`Passage`]s; pagination produces one [`PageMap`] per document.

mod document;
mod paragraph;
mod passage;

pub use document::Document;
pub use paragraph::{Paragraph, TextRun, TextStyle};
pub use passage::{Citation, PageMap, Passage};
