//! Page estimate from the layout hints stored in the document body.
//!
//! Word records a `w:lastRenderedPageBreak` wherever a page ended during the
//! last layout pass. Counting them in body order, and honoring section
//! restarts (`w:pgNumType/@w:start`), gives an approximate page per paragraph.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::request::PageRequest;
use super::strategy::PageStrategy;
use crate::docx::{read_part, DOCUMENT_PART};
use crate::error::Result;
use crate::model::PageMap;

/// Estimate the page of every top-level paragraph of a `word/document.xml`.
pub fn layout_pages(xml: &str) -> Result<PageMap> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut walker = LayoutWalker::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                walker.element(&e, false);
                walker.stack.push(e.local_name().as_ref().to_vec());
            }
            Event::Empty(e) => walker.element(&e, true),
            Event::End(e) => {
                walker.stack.pop();
                if e.local_name().as_ref() == b"p" {
                    walker.close_paragraph();
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.pages)
}

struct Frame {
    /// Top-level ordinal, if the paragraph is a direct child of the body
    ordinal: Option<usize>,
    /// Page at the start of the paragraph
    page: u32,
}

struct LayoutWalker {
    stack: Vec<Vec<u8>>,
    frames: Vec<Frame>,
    page: u32,
    next_ordinal: usize,
    pages: PageMap,
}

impl Default for LayoutWalker {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            frames: Vec::new(),
            page: 1,
            next_ordinal: 0,
            pages: PageMap::new(),
        }
    }
}

impl LayoutWalker {
    fn element(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"p" => {
                let ordinal = if self.stack.last().map(Vec::as_slice) == Some(b"body".as_slice()) {
                    self.next_ordinal += 1;
                    Some(self.next_ordinal - 1)
                } else {
                    None
                };
                let frame = Frame {
                    ordinal,
                    page: self.page,
                };
                if empty {
                    self.record(frame);
                } else {
                    self.frames.push(frame);
                }
            }
            b"lastRenderedPageBreak" if !self.frames.is_empty() => self.page += 1,
            b"pgNumType" if self.in_paragraph_section() => {
                if let Some(start) = start_attribute(e) {
                    self.page = start;
                    if let Some(frame) = self.frames.last_mut() {
                        frame.page = start;
                    }
                }
            }
            _ => {}
        }
    }

    /// `w:p/w:pPr/w:sectPr` is open: a section ends at this paragraph.
    fn in_paragraph_section(&self) -> bool {
        let n = self.stack.len();
        n >= 3
            && self.stack[n - 3].as_slice() == b"p"
            && self.stack[n - 2].as_slice() == b"pPr"
            && self.stack[n - 1].as_slice() == b"sectPr"
    }

    fn close_paragraph(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.record(frame);
        }
    }

    fn record(&mut self, frame: Frame) {
        if let Some(ordinal) = frame.ordinal {
            self.pages.insert(ordinal, frame.page);
        }
    }
}

fn start_attribute(e: &BytesStart<'_>) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"start")
        .and_then(|attr| String::from_utf8_lossy(&attr.value).trim().parse().ok())
}

/// Page estimate from rendered page breaks. Never needs an external process.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralHeuristic;

impl StructuralHeuristic {
    pub fn new() -> Self {
        Self
    }
}

impl PageStrategy for StructuralHeuristic {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn resolve(&self, request: &PageRequest) -> Option<PageMap> {
        let pages = read_part(&request.document, DOCUMENT_PART).and_then(|xml| layout_pages(&xml));
        match pages {
            Ok(all) => {
                let pages: PageMap = request
                    .ordinals
                    .iter()
                    .map(|&ordinal| (ordinal, all.get(&ordinal).copied().unwrap_or(1)))
                    .collect();
                log::info!(
                    "    Layout: {} page numbers (from rendered page breaks and section restarts)",
                    pages.len()
                );
                Some(pages)
            }
            Err(e) => {
                log::warn!("    Layout estimate failed for {}: {}", request.display_name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(content: &str) -> String {
        format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            content
        )
    }

    const BREAK: &str = "<w:r><w:lastRenderedPageBreak/><w:t>x</w:t></w:r>";

    #[test]
    fn test_counts_rendered_breaks() {
        let xml = body(&format!(
            "<w:p/><w:p>{BREAK}</w:p><w:p><w:r><w:t>y</w:t></w:r></w:p><w:p>{BREAK}{BREAK}</w:p><w:p/>"
        ));
        let pages = layout_pages(&xml).unwrap();
        assert_eq!(pages.get(&0), Some(&1));
        assert_eq!(pages.get(&1), Some(&1));
        assert_eq!(pages.get(&2), Some(&2));
        assert_eq!(pages.get(&3), Some(&2));
        assert_eq!(pages.get(&4), Some(&4));
    }

    #[test]
    fn test_table_breaks_count_but_are_not_recorded() {
        let xml = body(&format!(
            "<w:p/><w:tbl><w:tr><w:tc><w:p>{BREAK}</w:p></w:tc></w:tr></w:tbl><w:p/>"
        ));
        let pages = layout_pages(&xml).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages.get(&1), Some(&2));
    }

    #[test]
    fn test_section_restart() {
        let xml = body(&format!(
            r#"<w:p>{BREAK}</w:p><w:p><w:pPr><w:sectPr><w:pgNumType w:start="10"/></w:sectPr></w:pPr></w:p><w:p>{BREAK}</w:p><w:p/><w:sectPr><w:pgNumType w:start="99"/></w:sectPr>"#
        ));
        let pages = layout_pages(&xml).unwrap();
        assert_eq!(pages.get(&0), Some(&1));
        assert_eq!(pages.get(&1), Some(&10));
        assert_eq!(pages.get(&2), Some(&10));
        assert_eq!(pages.get(&3), Some(&11));
    }

    #[test]
    fn test_nested_breaks_not_double_counted() {
        let xml = body(
            "<w:p><w:r><w:txbxContent><w:p><w:r><w:lastRenderedPageBreak/></w:r></w:p></w:txbxContent></w:r></w:p><w:p/>",
        );
        let pages = layout_pages(&xml).unwrap();
        assert_eq!(pages.get(&1), Some(&2));
    }

    #[test]
    fn test_heuristic_on_unreadable_document() {
        let request = PageRequest::new("/nonexistent/x.docx").with_paragraph(0, "a");
        assert_eq!(StructuralHeuristic::new().resolve(&request), None);
    }
}
