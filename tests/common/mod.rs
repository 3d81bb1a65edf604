//! Synthetic `.docx` packages for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Package relationships pointing at the main document.
pub const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Wrap body content in a `w:document`.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// Write a package with the given entries.
pub fn write_package(path: &Path, entries: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// Write `name` into `dir` with the given body content.
pub fn write_docx(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let xml = document_xml(body);
    write_package(
        &path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", xml.as_str()),
        ],
    );
    path
}

/// A paragraph of runs.
pub fn p(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

/// A plain run.
pub fn r(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
}

/// A bold run.
pub fn b(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}

/// An italic run.
pub fn i(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}

/// A bold run in another font.
pub fn bf(text: &str, font: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:rFonts w:ascii="{}" w:hAnsi="{}"/><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        font, font, text
    )
}

/// A run starting with a rendered page break.
pub fn page_break(text: &str) -> String {
    format!(
        r#"<w:r><w:lastRenderedPageBreak/><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}
