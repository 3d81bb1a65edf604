//! Access to the zip package behind a `.docx` file.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::reader::attribute;
use crate::detect::is_docx_bytes;
use crate::error::{Error, Result};

/// Main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";

/// Open a package, rejecting files that are not zip containers.
pub fn open_package<P: AsRef<Path>>(path: P) -> Result<ZipArchive<BufReader<File>>> {
    let mut file = File::open(path.as_ref())?;

    let mut magic = [0u8; 4];
    let read = file.read(&mut magic)?;
    if !is_docx_bytes(&magic[..read]) {
        return Err(Error::UnknownFormat);
    }
    file.rewind()?;

    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Read one XML part of a package as text.
pub fn read_part<P: AsRef<Path>>(path: P, part: &str) -> Result<String> {
    let mut archive = open_package(path)?;
    read_archive_part(&mut archive, part)
}

fn read_archive_part<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> Result<String> {
    let mut file = archive
        .by_name(part)
        .map_err(|_| Error::MissingPart(part.to_string()))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// Re-serialize a package into `dest`.
///
/// Only parts reachable from the package relationships (`_rels/.rels` and
/// the `.rels` part of every reachable part) are written, together with
/// `[Content_Types].xml`, whose overrides for dropped parts are removed.
/// Orphans left by earlier edits, `[trash]/` leftovers, duplicate names and
/// entries that fail to decompress are dropped. Returns the number of
/// entries written.
pub fn write_clean_copy<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dest: Q) -> Result<usize> {
    let mut archive = open_package(src)?;
    let keep = reachable_parts(&mut archive)?;
    let mut writer = ZipWriter::new(File::create(dest.as_ref())?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen = HashSet::new();
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Dropping unreadable package entry #{}: {}", index, e);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let wanted = name == CONTENT_TYPES_PART || keep.contains(&name);
        if !wanted || !seen.insert(name.clone()) {
            log::debug!("Dropping package entry {}", name);
            continue;
        }

        let mut data = Vec::new();
        if let Err(e) = entry.read_to_end(&mut data) {
            log::warn!("Dropping corrupt package entry {}: {}", name, e);
            continue;
        }
        if name == CONTENT_TYPES_PART {
            match prune_content_types(&String::from_utf8_lossy(&data), &keep) {
                Ok(pruned) => data = pruned,
                Err(e) => log::warn!("Keeping {} as is: {}", name, e),
            }
        }

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}

/// Collect the parts reachable from `_rels/.rels`, relationship parts included.
///
/// Targets that point outside the package or at missing entries are ignored.
fn reachable_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<BTreeSet<String>> {
    let names: HashSet<String> = archive.file_names().map(str::to_string).collect();
    if !names.contains(ROOT_RELS_PART) {
        return Err(Error::MissingPart(ROOT_RELS_PART.to_string()));
    }

    let mut reachable = BTreeSet::from([ROOT_RELS_PART.to_string()]);
    let mut pending = vec![(String::new(), ROOT_RELS_PART.to_string())];

    while let Some((base, rels)) = pending.pop() {
        let xml = match read_archive_part(archive, &rels) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("Skipping relationships in {}: {}", rels, e);
                continue;
            }
        };
        for target in relationship_targets(&xml)? {
            let Some(part) = resolve_target(&base, &target) else {
                continue;
            };
            if !names.contains(&part) || !reachable.insert(part.clone()) {
                continue;
            }
            let (dir, file) = part.rsplit_once('/').unwrap_or(("", part.as_str()));
            let dir = if dir.is_empty() {
                String::new()
            } else {
                format!("{}/", dir)
            };
            let part_rels = format!("{}_rels/{}.rels", dir, file);
            if names.contains(&part_rels) && reachable.insert(part_rels.clone()) {
                pending.push((dir, part_rels));
            }
        }
    }

    Ok(reachable)
}

/// Internal `Target` values of a relationships part.
fn relationship_targets(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"TargetMode").as_deref() == Some("External") {
                    continue;
                }
                if let Some(target) = attribute(&e, b"Target") {
                    targets.push(target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// Resolve a relationship target against the directory of its source part.
///
/// `base` is empty or ends with `/`. A leading `/` makes the target
/// package-absolute. Returns `None` for targets that climb above the root.
fn resolve_target(base: &str, target: &str) -> Option<String> {
    let target = target.split('#').next().unwrap_or_default();
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}{}", base, target),
    };

    let mut segments = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Drop `Override` entries whose part is not being written.
fn prune_content_types(xml: &str, keep: &BTreeSet<String>) -> Result<Vec<u8>> {
    let kept: HashSet<String> = keep.iter().map(|part| part.to_ascii_lowercase()).collect();
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Empty(e) if e.local_name().as_ref() == b"Override" => {
                let part = attribute(e, b"PartName").unwrap_or_default();
                if !kept.contains(&part.trim_start_matches('/').to_ascii_lowercase()) {
                    continue;
                }
            }
            _ => {}
        }
        writer.write_event(event)?;
    }

    Ok(writer.into_inner())
}
