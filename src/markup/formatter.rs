//! Run-level markup generation.

use std::borrow::Cow;

use crate::glyph::normalize_glyphs;
use crate::model::TextStyle;

/// Body font of the source documents; runs in this font get no font span.
pub const DEFAULT_BODY_FONT: &str = "Times New Roman";

/// Marker inserted between paragraphs of a multi-paragraph passage.
pub const LINE_BREAK: &str = "<br>";

/// Converts runs into nested inline markup.
///
/// Nesting, innermost to outermost: font span, `<u>`, `<i>`, `<b>`.
#[derive(Debug, Clone)]
pub struct InlineFormatter {
    default_font: String,
}

impl InlineFormatter {
    /// Create a formatter for documents whose body font is `default_font`.
    pub fn new(default_font: impl Into<String>) -> Self {
        Self {
            default_font: default_font.into(),
        }
    }

    /// The font that never produces a span.
    pub fn default_font(&self) -> &str {
        &self.default_font
    }

    /// Format run text (or a slice of it) with the run's style.
    ///
    /// Empty text produces no markup.
    pub fn format_run(&self, text: &str, style: &TextStyle) -> String {
        let text = normalize_glyphs(text);
        if text.is_empty() {
            return String::new();
        }

        let mut result = escape_text(&text).into_owned();

        if let Some(font) = self.font_class(style) {
            result = format!("<span class=\"{}\">{}</span>", escape_attr(font), result);
        }
        if style.underline {
            result = format!("<u>{}</u>", result);
        }
        if style.italic {
            result = format!("<i>{}</i>", result);
        }
        if style.bold {
            result = format!("<b>{}</b>", result);
        }

        result
    }

    /// Font name worth a span: present, non-blank and not the body font.
    fn font_class<'a>(&self, style: &'a TextStyle) -> Option<&'a str> {
        style
            .font_name
            .as_deref()
            .map(str::trim)
            .filter(|font| !font.is_empty() && *font != self.default_font)
    }
}

impl Default for InlineFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_BODY_FONT)
    }
}

fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(escape_text(value).replace('"', "&quot;"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_run() {
        let f = InlineFormatter::default();
        assert_eq!(f.format_run("word", &TextStyle::default()), "word");
    }

    #[test]
    fn test_nesting_order() {
        let f = InlineFormatter::default();
        let style = TextStyle::bold()
            .with_italic()
            .with_underline()
            .with_font("Hebrew");
        assert_eq!(
            f.format_run("x", &style),
            "<b><i><u><span class=\"Hebrew\">x</span></u></i></b>"
        );
    }

    #[test]
    fn test_default_font_has_no_span() {
        let f = InlineFormatter::default();
        let style = TextStyle::default().with_font(DEFAULT_BODY_FONT);
        assert_eq!(f.format_run("x", &style), "x");

        let f = InlineFormatter::new("Garamond");
        let style = TextStyle::default().with_font("Garamond");
        assert_eq!(f.format_run("x", &style), "x");
    }

    #[test]
    fn test_missing_font_info() {
        let f = InlineFormatter::default();
        let style = TextStyle {
            italic: true,
            font_name: None,
            ..Default::default()
        };
        assert_eq!(f.format_run("y", &style), "<i>y</i>");
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let f = InlineFormatter::default();
        assert_eq!(f.format_run("", &TextStyle::bold()), "");
    }

    #[test]
    fn test_glyphs_and_escaping() {
        let f = InlineFormatter::default();
        assert_eq!(f.format_run("\u{F066}ish & <chips>", &TextStyle::default()), "fish &amp; &lt;chips&gt;");
        let style = TextStyle::default().with_font("A\"B");
        assert_eq!(f.format_run("z", &style), "<span class=\"A&quot;B\">z</span>");
    }
}
