//! Passage extraction from documents.

mod options;
mod scanner;

pub use options::{ExtractOptions, CLOSE_DELIMITER, OPEN_DELIMITER};
pub use scanner::{
    extract_passages, trailing_reference, Extraction, ExtractionReport, Scanner,
};
