//! Extraction and pagination phases over a set of documents.
//!
//! Phase one reads and scans every document; phase two asks the page
//! resolver about the paragraphs that host a passage and writes the pages
//! back. Both run one document at a time.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::detect::{discover_documents, DocumentFilter};
use crate::docx::read_document;
use crate::error::Result;
use crate::extract::{extract_passages, ExtractOptions, ExtractionReport};
use crate::model::{PageMap, Passage};
use crate::pagination::{PageRequest, PageResolver};

/// Passages extracted from one file.
#[derive(Debug, Clone)]
pub struct DocumentPassages {
    /// Source file
    pub path: PathBuf,

    /// Document name (file stem)
    pub name: String,

    /// Passages in document order
    pub passages: Vec<Passage>,

    /// Automaton counters
    pub report: ExtractionReport,

    /// Paragraphs to paginate, with their search snippets
    pub request: PageRequest,

    /// The file could not be read
    pub failed: bool,
}

impl DocumentPassages {
    fn failed(path: &Path, name: String) -> Self {
        Self {
            path: path.to_path_buf(),
            name,
            passages: Vec::new(),
            report: ExtractionReport::default(),
            request: PageRequest::new(path),
            failed: true,
        }
    }
}

/// Read and scan one document.
///
/// A document that cannot be read is logged and yields no passages.
pub fn extract_document<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> DocumentPassages {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            log::error!("Error processing {}: {}", path.display(), e);
            return DocumentPassages::failed(path, name);
        }
    };

    let extraction = extract_passages(&document, options);
    log::info!(
        "Found {} translations in {}",
        extraction.passages.len(),
        document.name
    );

    let request = PageRequest::for_paragraphs(
        path,
        &document,
        extraction.passages.iter().map(|p| p.paragraph),
    );

    DocumentPassages {
        path: path.to_path_buf(),
        name: document.name,
        passages: extraction.passages,
        report: extraction.report,
        request,
        failed: false,
    }
}

/// Discover and scan every matching document in `dir`.
pub fn extract_directory<P: AsRef<Path>>(
    dir: P,
    filter: &DocumentFilter,
    options: &ExtractOptions,
) -> Result<Vec<DocumentPassages>> {
    let paths = discover_documents(dir, filter)?;
    Ok(paths
        .iter()
        .map(|path| extract_document(path, options))
        .collect())
}

/// Set each passage's page from its paragraph; unmapped paragraphs get none.
pub fn assign_pages(passages: &mut [Passage], pages: &PageMap) {
    for passage in passages {
        passage.page = pages.get(&passage.paragraph).copied();
    }
}

/// Resolve pages for all documents and write them into the passages.
///
/// Returns how many documents each strategy resolved.
pub fn resolve_pages(
    documents: &mut [DocumentPassages],
    resolver: &PageResolver,
) -> BTreeMap<String, usize> {
    let requests = documents
        .iter()
        .filter(|d| !d.passages.is_empty())
        .map(|d| d.request.clone())
        .collect();

    let mut by_strategy = BTreeMap::new();
    for (path, resolution) in resolver.resolve_all(requests) {
        let Some(strategy) = resolution.strategy else {
            continue;
        };
        *by_strategy.entry(strategy.to_string()).or_insert(0) += 1;

        if let Some(document) = documents.iter_mut().find(|d| d.path == path) {
            assign_pages(&mut document.passages, &resolution.pages);
        }
    }

    let summary: Vec<String> = by_strategy
        .iter()
        .map(|(name, count)| format!("{} via {}", count, name))
        .collect();
    log::info!("Page numbers: {}", summary.join(", "));
    by_strategy
}

/// Counters for the end-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Documents read
    pub files_processed: usize,

    /// Documents that could not be read
    pub files_failed: usize,

    /// Passages extracted
    pub passages_found: usize,

    /// Passages written to the store
    pub passages_saved: usize,

    /// Closed passages dropped for lack of a citation
    pub passages_discarded: usize,

    /// Passages never closed
    pub passages_unclosed: usize,

    /// Passages closed by a trailing parenthetical
    pub implicit_closes: usize,

    /// Documents resolved per page strategy
    pub pages_by_strategy: BTreeMap<String, usize>,
}

impl RunStats {
    /// Tally the extraction phase.
    pub fn from_documents(documents: &[DocumentPassages]) -> Self {
        let mut stats = Self::default();
        for document in documents {
            if document.failed {
                stats.files_failed += 1;
                continue;
            }
            stats.files_processed += 1;
            stats.passages_found += document.passages.len();
            stats.passages_discarded += document.report.missing_citation;
            stats.passages_unclosed += document.report.unclosed;
            stats.implicit_closes += document.report.implicit_closes;
        }
        stats
    }

    /// Set the per-strategy document counts.
    pub fn with_pages_by_strategy(mut self, counts: BTreeMap<String, usize>) -> Self {
        self.pages_by_strategy = counts;
        self
    }

    /// Passages that were found but not saved.
    pub fn passages_lost(&self) -> usize {
        self.passages_found.saturating_sub(self.passages_saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Citation;

    fn passage(paragraph: usize) -> Passage {
        Passage {
            book: "YY-a".to_string(),
            page: None,
            text: "<b>x</b>".to_string(),
            citation: Citation::default(),
            paragraph,
        }
    }

    #[test]
    fn test_assign_pages() {
        let mut passages = vec![passage(2), passage(5), passage(2)];
        assign_pages(&mut passages, &PageMap::from([(2, 14)]));
        assert_eq!(passages[0].page, Some(14));
        assert_eq!(passages[1].page, None);
        assert_eq!(passages[2].page, Some(14));
    }

    #[test]
    fn test_unreadable_document_yields_nothing() {
        let result = extract_document("/nonexistent/YY-a.docx", &ExtractOptions::default());
        assert!(result.failed);
        assert!(result.passages.is_empty());
        assert_eq!(result.name, "YY-a");
    }

    #[test]
    fn test_run_stats() {
        let mut ok = DocumentPassages::failed(Path::new("YY-a.docx"), "YY-a".to_string());
        ok.failed = false;
        ok.passages = vec![passage(0), passage(1)];
        ok.report.missing_citation = 3;
        ok.report.unclosed = 1;
        let broken = DocumentPassages::failed(Path::new("YY-b.docx"), "YY-b".to_string());

        let mut stats = RunStats::from_documents(&[ok, broken]);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.passages_found, 2);
        assert_eq!(stats.passages_discarded, 3);
        assert_eq!(stats.passages_unclosed, 1);

        stats.passages_saved = 1;
        assert_eq!(stats.passages_lost(), 1);
    }
}
