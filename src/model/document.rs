//! Document-level types.

use super::{Paragraph, TextRun};
use serde::{Deserialize, Serialize};

/// A document read from a source file.
///
/// Only top-level paragraphs are kept; paragraphs nested inside tables or
/// text boxes are not addressable by ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable document name (the source title, usually the file stem)
    pub name: String,

    /// Top-level paragraphs in body order
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paragraphs: Vec::new(),
        }
    }

    /// Append a paragraph built from runs, assigning the next ordinal.
    pub fn push_runs(&mut self, runs: Vec<TextRun>) -> usize {
        let ordinal = self.paragraphs.len();
        self.paragraphs.push(Paragraph::with_runs(ordinal, runs));
        ordinal
    }

    /// Get a paragraph by ordinal.
    pub fn paragraph(&self, ordinal: usize) -> Option<&Paragraph> {
        self.paragraphs.get(ordinal)
    }

    /// Number of top-level paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if the document has any paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = Document::new("YY-v01");
        assert!(doc.is_empty());
        assert_eq!(doc.paragraph_count(), 0);
        assert_eq!(doc.name, "YY-v01");
    }

    #[test]
    fn test_ordinals_follow_insertion() {
        let mut doc = Document::new("book");
        assert_eq!(doc.push_runs(vec![TextRun::new("one")]), 0);
        assert_eq!(doc.push_runs(Vec::new()), 1);
        assert_eq!(doc.paragraph(1).map(|p| p.ordinal), Some(1));
        assert_eq!(doc.plain_text(), "one\n");
    }
}
