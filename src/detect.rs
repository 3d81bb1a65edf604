//! Document detection and discovery.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Zip local file header: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Prefix of the lock files Word leaves next to open documents.
const LOCK_FILE_PREFIX: &str = "~$";

/// Check a file header for the zip container signature.
///
/// # Example
/// ```
/// use unquote::detect::is_docx_bytes;
///
/// assert!(is_docx_bytes(b"PK\x03\x04\x14\x00"));
/// assert!(!is_docx_bytes(b"%PDF-1.7"));
/// ```
pub fn is_docx_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check whether a file on disk starts like a `.docx` package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut header = [0u8; 4];
    BufReader::new(file).read_exact(&mut header).is_ok() && is_docx_bytes(&header)
}

/// Which files in a directory are source documents.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    /// File name prefix (case-sensitive)
    pub prefix: String,

    /// File extension, without the dot (case-insensitive)
    pub extension: String,

    /// File name prefixes that are never processed
    pub excluded: Vec<String>,
}

impl DocumentFilter {
    /// Create a filter with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replace the excluded prefixes.
    pub fn with_excluded<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Add one excluded prefix.
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.excluded.push(prefix.into());
        self
    }

    /// Check a file name against the filter.
    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with(LOCK_FILE_PREFIX) || !file_name.starts_with(&self.prefix) {
            return false;
        }

        let extension_ok = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));

        extension_ok && !self.excluded.iter().any(|x| file_name.starts_with(x.as_str()))
    }
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self {
            prefix: "YY".to_string(),
            extension: "docx".to_string(),
            excluded: vec!["YY-s07".to_string()],
        }
    }
}

/// List the source documents of a directory, sorted by file name.
pub fn discover_documents<P: AsRef<Path>>(dir: P, filter: &DocumentFilter) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::Other(format!("Not a directory: {}", dir.display())));
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matched = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| filter.matches(name));
        if matched {
            found.push(path);
        }
    }

    found.sort();
    log::debug!("Discovered {} documents in {}", found.len(), dir.display());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_magic() {
        assert!(is_docx_bytes(b"PK\x03\x04rest"));
        assert!(!is_docx_bytes(b"PK"));
        assert!(!is_docx_bytes(b"<?xml"));
    }

    #[test]
    fn test_default_filter() {
        let filter = DocumentFilter::default();
        assert!(filter.matches("YY-v01.docx"));
        assert!(filter.matches("YY-v02.DOCX"));
        assert!(!filter.matches("~$YY-v01.docx"));
        assert!(!filter.matches("YY-s07.docx"));
        assert!(!filter.matches("YY-s07 backup.docx"));
        assert!(!filter.matches("YY-v01.doc"));
        assert!(!filter.matches("notes.docx"));
    }

    #[test]
    fn test_filter_builder() {
        let filter = DocumentFilter::new()
            .with_prefix("AB")
            .with_excluded(["AB-1"])
            .exclude("AB-2");
        assert!(filter.matches("AB-3.docx"));
        assert!(!filter.matches("AB-1.docx"));
        assert!(!filter.matches("AB-2.docx"));
        assert!(!filter.matches("YY-1.docx"));
    }

    #[test]
    fn test_discover_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["YY-b.docx", "YY-a.docx", "~$YY-a.docx", "YY-s07.docx", "other.txt"] {
            fs::write(dir.path().join(name), b"PK\x03\x04").unwrap();
        }
        fs::create_dir(dir.path().join("YY-dir.docx")).unwrap();

        let found = discover_documents(dir.path(), &DocumentFilter::default()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["YY-a.docx", "YY-b.docx"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let result = discover_documents("/nonexistent/unquote", &DocumentFilter::default());
        assert!(result.is_err());
    }
}
