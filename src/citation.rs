//! Citation parsing.
//!
//! A passage is followed by a parenthetical reference such as
//! `(Mizmowr / Song / Psalm 29:2 - in part)` or a bare `(6:18)`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::glyph::normalize_glyphs;
use crate::model::Citation;

fn wrapper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\s\x{00A0}]*\(([^)]+)\)").unwrap())
}

fn named_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s+(\d+):(\d+)(?:-(\d+))?\s*(.*)$").unwrap())
}

fn bare_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+):(\d+)(?:-(\d+))?\s*(.*)$").unwrap())
}

/// Pull the citation body out of the text that follows a closing delimiter.
///
/// The text must start (after optional whitespace or no-break spaces) with a
/// parenthetical group; its trimmed content is returned.
pub fn extract_citation(after_close: &str) -> Option<String> {
    let text = normalize_glyphs(after_close);
    let body = wrapper().captures(&text)?.get(1)?.as_str().trim();
    if body.is_empty() {
        None
    } else {
        log::debug!("Extracted cite: {}", body);
        Some(body.to_string())
    }
}

/// Parse a citation body into its fields.
///
/// Grammar, first match wins:
/// 1. `<name> <chapter>:<verse>[-<verse_end>] [<note>]`
/// 2. `<chapter>:<verse>[-<verse_end>] [<note>]`
/// 3. anything else: the whole text is the name.
pub fn parse_citation(text: &str) -> Citation {
    let text = text.trim();
    if text.is_empty() {
        return Citation::default();
    }

    let mut citation = named_reference()
        .captures(text)
        .and_then(|caps| numbered(&caps, 2, caps.get(1).map(|m| m.as_str().trim())))
        .or_else(|| {
            bare_reference()
                .captures(text)
                .and_then(|caps| numbered(&caps, 1, None))
        })
        .unwrap_or_else(|| Citation {
            label: Some(text.to_string()),
            ..Default::default()
        });

    if let Some(label) = citation.label.as_deref() {
        let (source, common) = split_name(label);
        citation.source_label = source;
        citation.common_label = common;
    }
    citation
}

/// Build a citation from the numeric groups starting at `first`.
fn numbered(caps: &Captures<'_>, first: usize, label: Option<&str>) -> Option<Citation> {
    let number = |i: usize| caps.get(i).map(|m| m.as_str().parse::<u32>());

    let chapter = number(first)?.ok()?;
    let verse = number(first + 1)?.ok()?;
    let verse_end = match number(first + 2) {
        Some(parsed) => Some(parsed.ok()?),
        None => None,
    };
    let note = caps.get(first + 3).and_then(|m| clean_note(m.as_str()));

    Some(Citation {
        label: label.filter(|l| !l.is_empty()).map(str::to_string),
        chapter: Some(chapter),
        verse: Some(verse),
        verse_end,
        note,
        ..Default::default()
    })
}

/// Strip leading and trailing non-letters; an empty result means no note.
fn clean_note(raw: &str) -> Option<String> {
    let note = raw.trim_matches(|c: char| !c.is_ascii_alphabetic());
    if note.is_empty() {
        None
    } else {
        Some(note.to_string())
    }
}

/// Split `Yirma'yah / Yah Uplifts / Jeremiah` into the source-language label
/// (first segment) and the common label (last segment).
///
/// Without a `/`, the whole name is the source-language label.
pub fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    match (name.split('/').next(), name.rsplit('/').next()) {
        (Some(first), Some(last)) if name.contains('/') => (non_empty(first), non_empty(last)),
        _ => (non_empty(name), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_with_note() {
        let c = parse_citation("Mizmowr / Song / Psalm 29:2 - in part");
        assert_eq!(c.label.as_deref(), Some("Mizmowr / Song / Psalm"));
        assert_eq!(c.chapter, Some(29));
        assert_eq!(c.verse, Some(2));
        assert_eq!(c.verse_end, None);
        assert_eq!(c.note.as_deref(), Some("in part"));
        assert_eq!(c.source_label.as_deref(), Some("Mizmowr"));
        assert_eq!(c.common_label.as_deref(), Some("Psalm"));
    }

    #[test]
    fn test_verse_range() {
        let c = parse_citation("Yirma'yah / Yah Uplifts / Jeremiah 7:17-18");
        assert_eq!(c.label.as_deref(), Some("Yirma'yah / Yah Uplifts / Jeremiah"));
        assert_eq!(c.chapter, Some(7));
        assert_eq!(c.verse, Some(17));
        assert_eq!(c.verse_end, Some(18));
        assert_eq!(c.note, None);
        assert_eq!(c.source_label.as_deref(), Some("Yirma'yah"));
        assert_eq!(c.common_label.as_deref(), Some("Jeremiah"));
    }

    #[test]
    fn test_bare_reference() {
        let c = parse_citation("6:18");
        assert_eq!(c.label, None);
        assert_eq!(c.chapter, Some(6));
        assert_eq!(c.verse, Some(18));
        assert_eq!(c.verse_end, None);
        assert_eq!(c.note, None);
        assert_eq!(c.source_label, None);
    }

    #[test]
    fn test_bare_reference_with_note() {
        let c = parse_citation("3:1-2 (paraphrased).");
        assert_eq!(c.chapter, Some(3));
        assert_eq!(c.verse_end, Some(2));
        assert_eq!(c.note.as_deref(), Some("paraphrased"));
    }

    #[test]
    fn test_fallback_name_only() {
        let c = parse_citation("Dabarym / Words");
        assert_eq!(c.label.as_deref(), Some("Dabarym / Words"));
        assert_eq!(c.chapter, None);
        assert_eq!(c.source_label.as_deref(), Some("Dabarym"));
        assert_eq!(c.common_label.as_deref(), Some("Words"));
        assert!(c.is_usable());
    }

    #[test]
    fn test_note_of_only_punctuation_is_absent() {
        let c = parse_citation("Yownah / Jonah 2:3 --.");
        assert_eq!(c.note, None);
    }

    #[test]
    fn test_empty_text() {
        assert!(!parse_citation("   ").is_usable());
    }

    #[test]
    fn test_split_name_without_slash() {
        assert_eq!(split_name(" Bare "), (Some("Bare".to_string()), None));
        assert_eq!(
            split_name("Yownah / Jonah"),
            (Some("Yownah".to_string()), Some("Jonah".to_string()))
        );
    }

    #[test]
    fn test_extract_citation_wrapper() {
        assert_eq!(
            extract_citation("\u{00A0} (Yownah / Jonah 2:3) and more"),
            Some("Yownah / Jonah 2:3".to_string())
        );
        assert_eq!(extract_citation(" no parenthesis"), None);
        assert_eq!(extract_citation("( )"), None);
        assert_eq!(extract_citation("text (6:18)"), None);
    }

    #[test]
    fn test_extract_citation_normalizes_glyphs() {
        assert_eq!(extract_citation("(B\u{F065}r\u{F065}shyth 1:1)").as_deref(), Some("Bereshyth 1:1"));
    }
}
