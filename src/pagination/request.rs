//! What needs a page number.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use super::automation::search_snippet;
use crate::model::Document;

/// Paragraphs of one document that need a page number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Source file
    pub document: PathBuf,

    /// Top-level paragraph ordinals
    pub ordinals: BTreeSet<usize>,

    /// Search text per ordinal; blank paragraphs have none
    pub snippets: BTreeMap<usize, String>,
}

impl PageRequest {
    /// Create an empty request for a document.
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            ..Default::default()
        }
    }

    /// Build a request for the given paragraphs, taking snippets from their text.
    pub fn for_paragraphs<I>(document: impl Into<PathBuf>, source: &Document, ordinals: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut request = Self::new(document);
        for ordinal in ordinals {
            let text = source
                .paragraph(ordinal)
                .map(|p| p.plain_text())
                .unwrap_or_default();
            request.add(ordinal, &text);
        }
        request
    }

    /// Request one paragraph, given its raw text.
    pub fn add(&mut self, ordinal: usize, raw_text: &str) {
        self.ordinals.insert(ordinal);
        if let Some(snippet) = search_snippet(raw_text) {
            self.snippets.insert(ordinal, snippet);
        }
    }

    /// Builder form of [`PageRequest::add`].
    pub fn with_paragraph(mut self, ordinal: usize, raw_text: &str) -> Self {
        self.add(ordinal, raw_text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// Size of the document on disk; 0 when it cannot be read.
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.document).map(|m| m.len()).unwrap_or(0)
    }

    /// File name for log messages.
    pub fn display_name(&self) -> String {
        self.document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.document.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;

    #[test]
    fn test_request_from_paragraphs() {
        let mut doc = Document::new("YY-a");
        doc.push_runs(vec![TextRun::new("  first | paragraph ")]);
        doc.push_runs(vec![]);
        doc.push_runs(vec![TextRun::bold("third")]);

        let request = PageRequest::for_paragraphs("YY-a.docx", &doc, [0, 1, 2, 9]);
        assert_eq!(request.ordinals.len(), 4);
        assert_eq!(request.snippets.len(), 2);
        assert_eq!(request.snippets[&0], "first   paragraph");
        assert_eq!(request.snippets[&2], "third");
        assert_eq!(request.display_name(), "YY-a.docx");
    }

    #[test]
    fn test_missing_file_size() {
        assert_eq!(PageRequest::new("/nonexistent/x.docx").file_size(), 0);
    }
}
