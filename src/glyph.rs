//! Private-use-area glyph repair.
//!
//! Embedded symbol fonts leave some Latin letters encoded in the Unicode
//! private use area (U+F0xx). Every mapping is one char to one char, so
//! character offsets computed on raw text stay valid after normalization.

use std::borrow::Cow;

const GLYPH_MAP: &[(char, char)] = &[
    ('\u{F065}', 'e'),
    ('\u{F066}', 'f'),
    ('\u{F069}', 'i'),
];

fn replacement(c: char) -> Option<char> {
    GLYPH_MAP
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Rewrite known private-use glyphs to their intended letters.
pub fn normalize_glyphs(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| replacement(c).unwrap_or(c))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_private_use_letters() {
        assert_eq!(normalize_glyphs("\u{F066}\u{F069}n\u{F065}"), "fine");
    }

    #[test]
    fn test_borrows_clean_text() {
        assert!(matches!(normalize_glyphs("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_preserves_char_count() {
        let raw = "a\u{F065}b\u{F0B7}";
        assert_eq!(raw.chars().count(), normalize_glyphs(raw).chars().count());
        // unmapped private-use glyphs pass through
        assert!(normalize_glyphs(raw).ends_with('\u{F0B7}'));
    }
}
