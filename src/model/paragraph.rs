//! Paragraph and run-level types.

use serde::{Deserialize, Serialize};

/// A top-level paragraph of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Position among the top-level paragraphs of the document body
    pub ordinal: usize,

    /// Text runs in document order
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    /// Create a new empty paragraph at the given ordinal.
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            runs: Vec::new(),
        }
    }

    /// Create a paragraph from a list of runs.
    pub fn with_runs(ordinal: usize, runs: Vec<TextRun>) -> Self {
        Self { ordinal, runs }
    }

    /// Get the concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Number of characters (not bytes) in the paragraph text.
    pub fn char_len(&self) -> usize {
        self.runs.iter().map(|run| run.char_len()).sum()
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.trim().is_empty())
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a text run with an explicit style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(text, TextStyle::bold())
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            TextStyle {
                italic: true,
                ..Default::default()
            },
        )
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of characters in the run.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text styling properties carried by a run.
///
/// Only direct formatting is modeled. A run without font information has
/// `font_name: None`, which renders exactly like the document's body font.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Font name, if set directly on the run
    pub font_name: Option<String>,
}

impl TextStyle {
    /// Plain bold style.
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Set the font name.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font_name = Some(font.into());
        self
    }

    /// Enable italic.
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Enable underline.
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let p = Paragraph::with_runs(
            0,
            vec![TextRun::new("Hello "), TextRun::bold("world"), TextRun::new("!")],
        );

        assert_eq!(p.plain_text(), "Hello world!");
        assert_eq!(p.char_len(), 12);
    }

    #[test]
    fn test_char_len_counts_chars() {
        let run = TextRun::new("\u{201C}ab\u{201D}");
        assert_eq!(run.char_len(), 4);
        assert!(run.text.len() > 4);
    }

    #[test]
    fn test_text_style() {
        let style = TextStyle::default();
        assert_eq!(style.font_name, None);

        let styled = TextStyle::bold().with_italic().with_font("Hebrew");
        assert!(styled.bold && styled.italic && !styled.underline);
        assert_eq!(styled.font_name.as_deref(), Some("Hebrew"));
    }

    #[test]
    fn test_empty_paragraph() {
        assert!(Paragraph::new(3).is_empty());
        assert!(Paragraph::with_runs(3, vec![TextRun::new("  ")]).is_empty());
        assert!(!Paragraph::with_runs(3, vec![TextRun::new("  "), TextRun::new("x")]).is_empty());
    }
}
