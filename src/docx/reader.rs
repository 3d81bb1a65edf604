//! WordprocessingML body reader.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::package::{read_part, DOCUMENT_PART};
use crate::error::Result;
use crate::model::{Document, TextRun};

/// Read a `.docx` file into a [`Document`].
///
/// The document name is the file stem. Only top-level body paragraphs are
/// kept; table cells, text boxes, deleted revisions and the source side of
/// moves are skipped.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let xml = read_part(path, DOCUMENT_PART)?;
    let document = parse_document_xml(&name, &xml)?;
    log::debug!(
        "Read {} with {} paragraphs",
        document.name,
        document.paragraph_count()
    );
    Ok(document)
}

/// Parse the content of `word/document.xml`.
pub fn parse_document_xml(name: &str, xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut body = BodyParser::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                body.start(&e, false);
                body.stack.push(e.local_name().as_ref().to_vec());
            }
            Event::Empty(e) => body.start(&e, true),
            Event::End(e) => {
                body.stack.pop();
                body.end(e.local_name().as_ref());
            }
            Event::Text(e) => {
                if body.in_text {
                    let text = e.unescape()?;
                    body.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut document = Document::new(name);
    for runs in body.paragraphs {
        document.push_runs(runs);
    }
    Ok(document)
}

#[derive(Default)]
struct BodyParser {
    /// Local names of the open elements, outermost first
    stack: Vec<Vec<u8>>,
    /// Finished top-level paragraphs
    paragraphs: Vec<Vec<TextRun>>,
    /// Runs of the open top-level paragraph
    current: Option<Vec<TextRun>>,
    /// Paragraphs open inside the current one (text boxes)
    nested: usize,
    /// Depth of deleted revisions
    deleted: usize,
    run: Option<TextRun>,
    in_text: bool,
}

impl BodyParser {
    fn parent(&self) -> Option<&[u8]> {
        self.stack.last().map(Vec::as_slice)
    }

    /// True when the next element belongs directly to the run being read.
    fn in_run(&self) -> bool {
        self.run.is_some() && self.nested == 0 && self.parent() == Some(b"r".as_slice())
    }

    /// True inside the run's own `rPr`. Former formatting recorded under
    /// `rPrChange` sits one level deeper and does not match.
    fn in_run_props(&self) -> bool {
        self.run.is_some()
            && self.nested == 0
            && matches!(self.stack.as_slice(), [.., r, props] if r == b"r" && props == b"rPr")
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) {
        let local = e.local_name();
        match local.as_ref() {
            b"p" => {
                if self.current.is_some() {
                    if !empty {
                        self.nested += 1;
                    }
                } else if self.parent() == Some(b"body".as_slice()) {
                    if empty {
                        self.paragraphs.push(Vec::new());
                    } else {
                        self.current = Some(Vec::new());
                    }
                }
            }
            b"del" | b"moveFrom" if !empty => self.deleted += 1,
            b"r" if !empty => {
                if self.current.is_some() && self.nested == 0 && self.deleted == 0 {
                    self.run = Some(TextRun::new(String::new()));
                }
            }
            b"b" | b"i" | b"u" | b"rFonts" if self.in_run_props() => {
                self.apply_property(local.as_ref(), e)
            }
            b"t" if !empty && self.in_run() => self.in_text = true,
            b"tab" if self.in_run() => self.push_text("\t"),
            b"br" | b"cr" if self.in_run() => {
                let kind = attribute(e, b"type");
                if matches!(kind.as_deref(), None | Some("textWrapping")) {
                    self.push_text("\n");
                }
            }
            b"noBreakHyphen" if self.in_run() => self.push_text("-"),
            _ => {}
        }
    }

    fn end(&mut self, local: &[u8]) {
        match local {
            b"p" if self.current.is_some() => {
                if self.nested > 0 {
                    self.nested -= 1;
                } else if let Some(runs) = self.current.take() {
                    self.paragraphs.push(runs);
                }
            }
            b"r" if self.nested == 0 => {
                if let Some(run) = self.run.take() {
                    if let Some(runs) = self.current.as_mut() {
                        if !run.is_empty() {
                            runs.push(run);
                        }
                    }
                }
            }
            b"t" => self.in_text = false,
            b"del" | b"moveFrom" => self.deleted = self.deleted.saturating_sub(1),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.nested > 0 {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn apply_property(&mut self, name: &[u8], e: &BytesStart<'_>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let value = attribute(e, b"val");
        match name {
            b"b" => run.style.bold = toggle_on(value.as_deref()),
            b"i" => run.style.italic = toggle_on(value.as_deref()),
            b"u" => {
                run.style.underline = !matches!(value.as_deref(), Some("none" | "0" | "false"))
            }
            b"rFonts" => {
                if let Some(font) = attribute(e, b"ascii") {
                    run.style.font_name = Some(font);
                }
            }
            _ => {}
        }
    }
}

/// `<w:b/>` is on; `<w:b w:val="0"/>` (or false/off) is off.
fn toggle_on(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off"))
}

pub(super) fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}
