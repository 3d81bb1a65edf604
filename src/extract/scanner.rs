//! The passage extraction automaton.
//!
//! Runs are scanned paragraph by paragraph. A bold run containing the opening
//! delimiter starts a passage; formatted run text accumulates, across runs and
//! paragraphs, until a bold run containing the closing delimiter. Whatever
//! follows the close, up to the end of that paragraph, is searched for the
//! citation. A paragraph that ends in `(... 12:3 ...)` while a passage is still
//! open closes it implicitly.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::ExtractOptions;
use crate::citation::{extract_citation, parse_citation};
use crate::glyph::normalize_glyphs;
use crate::markup::{consolidate, InlineFormatter, LINE_BREAK};
use crate::model::{Citation, Document, Paragraph, Passage, TextRun, TextStyle};

fn chapter_verse() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+:\d+").unwrap())
}

/// Automaton states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionState {
    /// Looking for a bold opening delimiter
    Searching,
    /// Inside a passage, accumulating formatted text
    Extracting,
    /// Closing delimiter seen; collecting citation text until paragraph end
    FoundQuote,
}

/// Counters for the conditions the automaton logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Paragraphs scanned
    pub paragraphs: usize,

    /// Passages emitted
    pub passages: usize,

    /// Passages closed by a trailing parenthetical instead of a delimiter
    pub implicit_closes: usize,

    /// Closed passages dropped for lack of a usable citation
    pub missing_citation: usize,

    /// Passages still open at end of document
    pub unclosed: usize,
}

/// Result of scanning one document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Emitted passages in document order
    pub passages: Vec<Passage>,

    /// What happened along the way
    pub report: ExtractionReport,
}

/// Extract every citable passage from a document.
pub fn extract_passages(doc: &Document, options: &ExtractOptions) -> Extraction {
    log::info!("Processing document: {}", doc.name);

    let mut scanner = Scanner::new(&doc.name, options);
    for paragraph in &doc.paragraphs {
        scanner.feed(paragraph);
    }
    scanner.finish()
}

/// Scan state for one document.
///
/// All accumulation lives here, so independent documents never share state.
pub struct Scanner<'a> {
    book: &'a str,
    open: char,
    close: char,
    formatter: InlineFormatter,
    state: ExtractionState,
    fragments: Vec<String>,
    citation_text: String,
    start_paragraph: usize,
    // Index into `fragments` where the current paragraph's output begins.
    paragraph_mark: usize,
    // Char offset in the current paragraph where passage text begins.
    extract_from: usize,
    passages: Vec<Passage>,
    report: ExtractionReport,
}

impl<'a> Scanner<'a> {
    /// Create a scanner for the document named `book`.
    pub fn new(book: &'a str, options: &ExtractOptions) -> Self {
        Self {
            book,
            open: options.open_delimiter,
            close: options.close_delimiter,
            formatter: InlineFormatter::new(options.default_font.clone()),
            state: ExtractionState::Searching,
            fragments: Vec::new(),
            citation_text: String::new(),
            start_paragraph: 0,
            paragraph_mark: 0,
            extract_from: 0,
            passages: Vec::new(),
            report: ExtractionReport::default(),
        }
    }

    /// Scan one paragraph.
    pub fn feed(&mut self, paragraph: &Paragraph) {
        log::trace!(
            "Paragraph {}: {}",
            paragraph.ordinal,
            paragraph.plain_text().chars().take(50).collect::<String>()
        );
        self.report.paragraphs += 1;
        self.paragraph_mark = self.fragments.len();
        self.extract_from = 0;

        let mut offset = 0;
        for run in &paragraph.runs {
            match self.state {
                ExtractionState::FoundQuote => self.citation_text.push_str(&run.text),
                ExtractionState::Searching => self.try_open(paragraph.ordinal, run, offset),
                ExtractionState::Extracting => self.continue_passage(paragraph.ordinal, run),
            }
            offset += run.char_len();
        }

        match self.state {
            ExtractionState::Extracting => self.end_open_paragraph(paragraph),
            ExtractionState::FoundQuote => self.close_with_citation_text(),
            ExtractionState::Searching => {}
        }
    }

    /// Finish the document and hand back what was found.
    pub fn finish(mut self) -> Extraction {
        match self.state {
            ExtractionState::FoundQuote if !self.fragments.is_empty() => {
                self.close_with_citation_text();
            }
            ExtractionState::Extracting => {
                self.report.unclosed += 1;
                log::warn!(
                    "Document {} has unclosed passage starting at paragraph {} (missing closing quote)",
                    self.book,
                    self.start_paragraph
                );
            }
            _ => {}
        }

        self.report.passages = self.passages.len();
        Extraction {
            passages: self.passages,
            report: self.report,
        }
    }

    fn try_open(&mut self, ordinal: usize, run: &TextRun, offset: usize) {
        if !run.style.bold {
            return;
        }
        let Some(at) = run.text.find(self.open) else {
            return;
        };

        log::debug!("Found opening quote at paragraph {}", ordinal);
        self.state = ExtractionState::Extracting;
        self.start_paragraph = ordinal;
        self.paragraph_mark = self.fragments.len();
        self.extract_from = offset + run.text[..at].chars().count() + 1;

        let after = &run.text[at + self.open.len_utf8()..];
        match after.find(self.close) {
            Some(end) => {
                self.push_formatted(&after[..end], &run.style);
                self.citation_text = after[end + self.close.len_utf8()..].to_string();
                self.state = ExtractionState::FoundQuote;
            }
            None => self.push_formatted(after, &run.style),
        }
    }

    fn continue_passage(&mut self, ordinal: usize, run: &TextRun) {
        if run.style.bold {
            if let Some(at) = run.text.find(self.close) {
                log::debug!("Found closing quote at paragraph {}", ordinal);
                self.push_formatted(&run.text[..at], &run.style);
                self.citation_text = run.text[at + self.close.len_utf8()..].to_string();
                self.state = ExtractionState::FoundQuote;
                return;
            }
        }
        self.push_formatted(&run.text, &run.style);
    }

    /// Paragraph ended with the passage still open: either it is closed by a
    /// trailing reference, or it continues on the next paragraph.
    fn end_open_paragraph(&mut self, paragraph: &Paragraph) {
        let text = normalize_glyphs(&paragraph.plain_text()).into_owned();

        match trailing_reference(&text) {
            Some((paren_start, body)) => {
                self.fragments.truncate(self.paragraph_mark);
                self.rewalk(paragraph, self.extract_from, paren_start);
                self.report.implicit_closes += 1;
                log::debug!(
                    "Passage at paragraph {} closed by trailing reference ({})",
                    self.start_paragraph,
                    body
                );
                self.emit(parse_citation(&body));
                self.reset();
            }
            None => self.fragments.push(LINE_BREAK.to_string()),
        }
    }

    /// Rebuild this paragraph's markup for chars `from..to` only.
    fn rewalk(&mut self, paragraph: &Paragraph, from: usize, to: usize) {
        let mut pos = 0;
        for run in &paragraph.runs {
            let len = run.char_len();
            let end = pos + len;
            if end > from && pos < to {
                let lo = from.saturating_sub(pos);
                let hi = (to - pos).min(len);
                if hi > lo {
                    self.push_formatted(char_slice(&run.text, lo, hi), &run.style);
                }
            }
            pos = end;
        }
    }

    fn close_with_citation_text(&mut self) {
        match extract_citation(&self.citation_text) {
            Some(body) => self.emit(parse_citation(&body)),
            None => {
                self.report.missing_citation += 1;
                log::info!(
                    "Skipped passage without citation at paragraph {} of {}",
                    self.start_paragraph,
                    self.book
                );
            }
        }
        self.reset();
    }

    fn emit(&mut self, citation: Citation) {
        if !citation.is_usable() {
            self.report.missing_citation += 1;
            log::info!(
                "Skipped passage with unusable citation at paragraph {} of {}",
                self.start_paragraph,
                self.book
            );
            return;
        }

        let text = consolidate(&self.fragments.concat());
        log::info!(
            "Extracted passage #{} from {}",
            self.passages.len() + 1,
            self.book
        );
        log::debug!("  Cite: {}", citation.reference());

        self.passages.push(Passage {
            book: self.book.to_string(),
            page: None,
            text,
            citation,
            paragraph: self.start_paragraph,
        });
        if let Some(passage) = self.passages.last() {
            log::debug!("  Text preview: {}", passage.preview(100));
        }
    }

    fn push_formatted(&mut self, text: &str, style: &TextStyle) {
        let formatted = self.formatter.format_run(text, style);
        if !formatted.is_empty() {
            self.fragments.push(formatted);
        }
    }

    fn reset(&mut self) {
        self.state = ExtractionState::Searching;
        self.fragments.clear();
        self.citation_text.clear();
    }
}

/// Find a balanced parenthetical group ending the text whose content holds a
/// `chapter:verse` pair. Returns the char offset of its `(` and its trimmed
/// content.
pub fn trailing_reference(text: &str) -> Option<(usize, String)> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(')') {
        return None;
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut depth = 0usize;
    for i in (0..chars.len()).rev() {
        match chars[i] {
            ')' => depth += 1,
            '(' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let body: String = chars[i + 1..chars.len() - 1].iter().collect();
                    let body = body.trim();
                    return chapter_verse()
                        .is_match(body)
                        .then(|| (i, body.to_string()));
                }
            }
            _ => {}
        }
    }
    None
}

fn char_slice(text: &str, lo: usize, hi: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    &text[byte_at(lo)..byte_at(hi)]
}
