//! Consolidation of concatenated run markup.
//!
//! Per-run formatting produces `</b><b>` seams and runs of identical font
//! spans wherever consecutive runs share attributes. Consolidation removes
//! those seams without touching the text.

use regex::Regex;
use std::sync::OnceLock;

const SIMPLE_TAGS: [&str; 3] = ["b", "i", "u"];
const SPAN_CLOSE: &str = "</span>";

fn leaf_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<span class="([^"]*)">[^<]*</span>"#).unwrap())
}

/// Merge adjacent spans and drop redundant tag seams until nothing changes.
pub fn consolidate(markup: &str) -> String {
    let mut current = markup.to_string();
    loop {
        let next = remove_tag_seams(&merge_font_spans(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Merge `<span class="X">a</span><span class="X">b</span>` into
/// `<span class="X">ab</span>`, repeating at the same spot while the merged
/// span is followed by another span of the same class.
pub fn merge_font_spans(markup: &str) -> String {
    let re = leaf_span();
    let mut out = markup.to_string();
    let mut pos = 0;

    while let Some(caps) = re.captures_at(&out, pos) {
        let (start, end, class) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(class)) => (whole.start(), whole.end(), class.as_str().to_string()),
            _ => break,
        };

        let opening = format!("<span class=\"{}\">", class);
        if out[end..].starts_with(&opening) {
            out.replace_range(end - SPAN_CLOSE.len()..end + opening.len(), "");
            pos = start;
        } else {
            pos = end;
        }
    }

    out
}

/// Remove `</b><b>`, `</i><i>` and `</u><u>` seams, bold first so the inner
/// tags it exposes are caught in the same pass.
pub fn remove_tag_seams(markup: &str) -> String {
    let mut out = markup.to_string();
    for tag in SIMPLE_TAGS {
        let seam = format!("</{tag}><{tag}>");
        if out.contains(&seam) {
            out = out.replace(&seam, "");
        }
    }
    out
}
