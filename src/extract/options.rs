//! Extraction options and configuration.

use crate::markup::DEFAULT_BODY_FONT;

/// Left double quotation mark, opens a passage when bold.
pub const OPEN_DELIMITER: char = '\u{201C}';

/// Right double quotation mark, closes a passage when bold.
pub const CLOSE_DELIMITER: char = '\u{201D}';

/// Options for passage extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Character that opens a passage (only in a bold run)
    pub open_delimiter: char,

    /// Character that closes a passage (only in a bold run)
    pub close_delimiter: char,

    /// Body font of the documents; runs in other fonts get a font span
    pub default_font: String,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document body font.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    /// Set the passage delimiters.
    pub fn with_delimiters(mut self, open: char, close: char) -> Self {
        self.open_delimiter = open;
        self.close_delimiter = close;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            open_delimiter: OPEN_DELIMITER,
            close_delimiter: CLOSE_DELIMITER,
            default_font: DEFAULT_BODY_FONT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.open_delimiter, '\u{201C}');
        assert_eq!(options.close_delimiter, '\u{201D}');
        assert_eq!(options.default_font, "Times New Roman");
    }

    #[test]
    fn test_options_builder() {
        let options = ExtractOptions::new()
            .with_default_font("Garamond")
            .with_delimiters('«', '»');
        assert_eq!(options.default_font, "Garamond");
        assert_eq!(options.open_delimiter, '«');
        assert_eq!(options.close_delimiter, '»');
    }
}
