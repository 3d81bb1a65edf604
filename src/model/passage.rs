//! Extracted passages and their citations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Paragraph ordinal to printed page number, scoped to one document.
pub type PageMap = BTreeMap<usize, u32>;

/// A parsed bibliographic reference such as `Yownah / Jonah 2:3-4 - in part`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Full citation label (everything before the chapter number)
    pub label: Option<String>,

    /// Source-language label (first `/` segment of the label)
    pub source_label: Option<String>,

    /// Common label (last `/` segment of the label)
    pub common_label: Option<String>,

    /// Chapter number
    pub chapter: Option<u32>,

    /// First verse
    pub verse: Option<u32>,

    /// Last verse of a range
    pub verse_end: Option<u32>,

    /// Free-text note following the reference
    pub note: Option<String>,
}

impl Citation {
    /// A citation can back a stored passage only if it names something or
    /// points at a chapter.
    pub fn is_usable(&self) -> bool {
        self.label.is_some() || self.chapter.is_some()
    }

    /// Short `label chapter:verse` form used in logs.
    pub fn reference(&self) -> String {
        let mut out = self.label.clone().unwrap_or_default();
        if let (Some(chapter), Some(verse)) = (self.chapter, self.verse) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{}:{}", chapter, verse));
            if let Some(end) = self.verse_end {
                out.push_str(&format!("-{}", end));
            }
        }
        out
    }
}

/// A quoted translation excerpt with its citation and page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Source book (document name)
    pub book: String,

    /// Printed page number, filled in by pagination
    pub page: Option<u32>,

    /// Formatted markup of the quoted text
    pub text: String,

    /// Parsed trailing citation
    pub citation: Citation,

    /// Ordinal of the top-level paragraph where the passage starts.
    /// Only meaningful until pagination has run.
    #[serde(skip)]
    pub paragraph: usize,
}

impl Passage {
    /// Text preview limited to `max` characters.
    pub fn preview(&self, max: usize) -> String {
        if self.text.chars().count() <= max {
            self.text.clone()
        } else {
            let cut: String = self.text.chars().take(max).collect();
            format!("{}...", cut)
        }
    }
}
