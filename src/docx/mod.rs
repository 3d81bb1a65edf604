//! `.docx` document source.
//!
//! A `.docx` file is a zip package; the body lives in `word/document.xml`.

mod package;
mod reader;

pub use package::{open_package, read_part, write_clean_copy, DOCUMENT_PART};
pub use reader::{parse_document_xml, read_document};
