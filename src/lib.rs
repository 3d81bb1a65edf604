//! # unquote
//!
//! Extraction of quoted translation passages from Word documents.
//!
//! A passage is text delimited by a **bold** opening and closing curly
//! quotation mark, followed by a parenthetical citation such as
//! `(Yownah / Jonah 2:3)`. Each passage is returned with its inline
//! formatting as HTML-like markup, its parsed citation and, once resolved,
//! the printed page it appears on.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unquote::extract_file;
//!
//! fn main() -> unquote::Result<()> {
//!     let extraction = extract_file("YY-v01.docx")?;
//!     for passage in &extraction.passages {
//!         println!("{} {}", passage.citation.reference(), passage.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Cross-run, cross-paragraph scanning**: passages may span any number of runs and paragraphs
//! - **Implicit closes**: a paragraph ending in `(... 12:3)` closes a passage missing its quote
//! - **Citation grammar**: name, chapter, verse, verse range and note
//! - **Page resolution**: live search through Word or a helper, with a layout estimate fallback

pub mod citation;
pub mod detect;
pub mod docx;
pub mod error;
pub mod extract;
pub mod glyph;
pub mod markup;
pub mod model;
pub mod pagination;
pub mod pipeline;

// Re-export commonly used types
pub use citation::{extract_citation, parse_citation, split_name};
pub use detect::{discover_documents, is_docx, is_docx_bytes, DocumentFilter};
pub use docx::{read_document, write_clean_copy};
pub use error::{Error, Result};
pub use extract::{extract_passages, ExtractOptions, Extraction, ExtractionReport, Scanner};
pub use glyph::normalize_glyphs;
pub use markup::{consolidate, InlineFormatter};
pub use model::{Citation, Document, PageMap, Paragraph, Passage, TextRun, TextStyle};
pub use pagination::{
    Automation, AutomationHost, PageRequest, PageResolver, PageStrategy, Resolution,
    TimeoutPolicy,
};
pub use pipeline::{DocumentPassages, RunStats};

use std::path::Path;

/// Extract passages from a `.docx` file with default options.
///
/// # Example
///
/// ```no_run
/// use unquote::extract_file;
///
/// let extraction = extract_file("YY-v01.docx").unwrap();
/// println!("Passages: {}", extraction.passages.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    extract_file_with_options(path, &ExtractOptions::default())
}

/// Extract passages from a `.docx` file with custom options.
///
/// # Example
///
/// ```no_run
/// use unquote::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().with_default_font("Garamond");
/// let extraction = extract_file_with_options("YY-v01.docx", &options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Extraction> {
    let document = read_document(path)?;
    Ok(extract_passages(&document, options))
}

/// Builder for a full run over a directory.
///
/// # Example
///
/// ```no_run
/// use unquote::{PageResolver, Unquote};
///
/// let result = Unquote::new()
///     .with_prefix("YY")
///     .exclude("YY-s07")
///     .with_resolver(PageResolver::layout_only())
///     .run("./volumes")?;
/// println!("{} passages", result.stats.passages_found);
/// # Ok::<(), unquote::Error>(())
/// ```
pub struct Unquote {
    options: ExtractOptions,
    filter: DocumentFilter,
    resolver: Option<PageResolver>,
}

impl Unquote {
    /// Create a new builder with default options and no pagination.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
            filter: DocumentFilter::default(),
            resolver: None,
        }
    }

    /// Set the document body font.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.options = self.options.with_default_font(font);
        self
    }

    /// Set the file name prefix of source documents.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filter = self.filter.with_prefix(prefix);
        self
    }

    /// Skip documents whose file name starts with `prefix`.
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.filter = self.filter.exclude(prefix);
        self
    }

    /// Replace the document filter.
    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Resolve page numbers with the given resolver.
    pub fn with_resolver(mut self, resolver: PageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Extract every matching document in `dir`, then resolve pages if a
    /// resolver is set.
    pub fn run<P: AsRef<Path>>(&self, dir: P) -> Result<UnquoteResult> {
        let mut documents = pipeline::extract_directory(dir, &self.filter, &self.options)?;
        let mut stats = RunStats::from_documents(&documents);

        if let Some(resolver) = &self.resolver {
            let by_strategy = pipeline::resolve_pages(&mut documents, resolver);
            stats = stats.with_pages_by_strategy(by_strategy);
        }

        Ok(UnquoteResult { documents, stats })
    }
}

impl Default for Unquote {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a directory run.
#[derive(Debug, Clone)]
pub struct UnquoteResult {
    /// Per-document passages, in file name order
    pub documents: Vec<DocumentPassages>,

    /// Summary counters
    pub stats: RunStats,
}

impl UnquoteResult {
    /// All passages, document by document.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.documents.iter().flat_map(|d| d.passages.iter())
    }

    /// Take all passages.
    pub fn into_passages(self) -> Vec<Passage> {
        self.documents
            .into_iter()
            .flat_map(|d| d.passages)
            .collect()
    }

    /// Serialize all passages as a pretty JSON array.
    pub fn to_json(&self) -> Result<String> {
        let passages: Vec<&Passage> = self.passages().collect();
        serde_json::to_string_pretty(&passages).map_err(|e| Error::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_builder() {
        let builder = Unquote::new()
            .with_default_font("Garamond")
            .with_prefix("AB")
            .exclude("AB-9");

        assert_eq!(builder.options.default_font, "Garamond");
        assert_eq!(builder.filter.prefix, "AB");
        assert!(builder.filter.excluded.contains(&"AB-9".to_string()));
        assert!(builder.filter.excluded.contains(&"YY-s07".to_string()));
        assert!(builder.resolver.is_none());
    }

    #[test]
    fn test_unquote_builder_with_resolver() {
        let builder = Unquote::default().with_resolver(PageResolver::layout_only());
        assert!(builder.resolver.is_some());
    }

    #[test]
    fn test_extract_file_missing() {
        let result = extract_file("/nonexistent/YY-v01.docx");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_run_on_missing_directory() {
        assert!(Unquote::new().run("/nonexistent/unquote").is_err());
    }

    #[test]
    fn test_empty_result_json() {
        let result = UnquoteResult {
            documents: Vec::new(),
            stats: RunStats::default(),
        };
        assert_eq!(result.to_json().unwrap(), "[]");
        assert_eq!(result.passages().count(), 0);
    }
}
