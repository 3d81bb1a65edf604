//! Page lookup strategies.

use std::path::Path;

use super::automation::{Automation, TimeoutPolicy};
use super::request::PageRequest;
use crate::docx::write_clean_copy;
use crate::error::Error;
use crate::model::PageMap;

/// One way of finding page numbers.
///
/// A strategy answers `None` (or an empty map) when it has nothing; the
/// resolver then moves on to the next one. Failures are logged here and
/// never propagated.
pub trait PageStrategy: Send + Sync {
    /// Short name used in logs and run summaries.
    fn name(&self) -> &'static str;

    /// Find pages for the requested paragraphs.
    fn resolve(&self, request: &PageRequest) -> Option<PageMap>;
}

/// Search the document itself with the automation host.
#[derive(Debug, Clone)]
pub struct LiveLookup {
    automation: Automation,
    timeouts: TimeoutPolicy,
}

impl LiveLookup {
    pub fn new(automation: Automation) -> Self {
        Self {
            automation,
            timeouts: TimeoutPolicy::default(),
        }
    }

    /// Set the timeout policy.
    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run the lookup against `path`, which may be a copy of the requested
    /// document. The timeout is always derived from the original.
    fn lookup_at(&self, path: &Path, request: &PageRequest) -> Option<PageMap> {
        if request.snippets.is_empty() {
            return None;
        }

        let timeout = self.timeouts.for_file(&request.document);
        match self.automation.lookup(path, &request.snippets, timeout) {
            Ok(pages) if !pages.is_empty() => {
                log::info!(
                    "    {}: {}/{} page numbers",
                    self.automation.host(),
                    pages.len(),
                    request.ordinals.len()
                );
                Some(pages)
            }
            Ok(_) => None,
            Err(Error::Timeout(after)) => {
                log::warn!(
                    "    {} timed out for {} after {}s",
                    self.automation.host(),
                    request.display_name(),
                    after.as_secs()
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "    {} failed for {}: {}",
                    self.automation.host(),
                    request.display_name(),
                    e
                );
                None
            }
        }
    }
}

impl PageStrategy for LiveLookup {
    fn name(&self) -> &'static str {
        "live"
    }

    fn resolve(&self, request: &PageRequest) -> Option<PageMap> {
        self.lookup_at(&request.document, request)
    }
}

/// Re-save the package into a temporary copy, then search the copy.
#[derive(Debug, Clone)]
pub struct CleanCopyLookup {
    live: LiveLookup,
}

impl CleanCopyLookup {
    pub fn new(live: LiveLookup) -> Self {
        Self { live }
    }
}

impl PageStrategy for CleanCopyLookup {
    fn name(&self) -> &'static str {
        "clean-copy"
    }

    fn resolve(&self, request: &PageRequest) -> Option<PageMap> {
        if request.snippets.is_empty() {
            return None;
        }

        let dir = match tempfile::Builder::new().prefix("unquote-clean-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                log::warn!("    Clean copy attempt failed: {}", e);
                return None;
            }
        };
        let copy = dir.path().join("clean_copy.docx");
        if let Err(e) = write_clean_copy(&request.document, &copy) {
            log::warn!("    Clean copy attempt failed: {}", e);
            return None;
        }

        self.live.lookup_at(&copy, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_without_snippets() {
        let live = LiveLookup::new(Automation::helper("/nonexistent/helper"));
        let request = PageRequest::new("doc.docx").with_paragraph(3, "   ");
        assert_eq!(live.resolve(&request), None);
    }

    #[test]
    fn test_live_absorbs_host_failure() {
        let live = LiveLookup::new(Automation::helper("/nonexistent/helper"));
        let request = PageRequest::new("doc.docx").with_paragraph(3, "text");
        assert_eq!(live.resolve(&request), None);
    }

    #[test]
    fn test_clean_copy_of_missing_document() {
        let strategy = CleanCopyLookup::new(LiveLookup::new(Automation::word()));
        let request = PageRequest::new("/nonexistent/doc.docx").with_paragraph(0, "text");
        assert_eq!(strategy.resolve(&request), None);
    }

    #[test]
    fn test_strategy_names() {
        let live = LiveLookup::new(Automation::word());
        assert_eq!(live.name(), "live");
        assert_eq!(CleanCopyLookup::new(live).name(), "clean-copy");
    }
}
