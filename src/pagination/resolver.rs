//! Ordered fallback over page strategies.

use std::path::PathBuf;
use std::sync::Arc;

use super::automation::Automation;
use super::heuristic::StructuralHeuristic;
use super::request::PageRequest;
use super::strategy::{CleanCopyLookup, LiveLookup, PageStrategy};
use crate::model::PageMap;

/// Page used for requested paragraphs a strategy did not place.
pub const DEFAULT_PAGE: u32 = 1;

/// Outcome of resolving one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the strategy that answered, `None` when all failed
    pub strategy: Option<&'static str>,

    /// Page per requested ordinal; empty when all strategies failed
    pub pages: PageMap,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.strategy.is_some()
    }
}

/// Tries strategies in order and keeps the first non-empty answer.
#[derive(Clone, Default)]
pub struct PageResolver {
    strategies: Vec<Arc<dyn PageStrategy>>,
}

impl PageResolver {
    /// Create a resolver with no strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full chain: live lookup, live lookup on a clean copy, layout estimate.
    pub fn with_automation(automation: Automation) -> Self {
        let live = LiveLookup::new(automation);
        Self::new()
            .with_strategy(live.clone())
            .with_strategy(CleanCopyLookup::new(live))
            .with_strategy(StructuralHeuristic::new())
    }

    /// Only the layout estimate; no external process is started.
    pub fn layout_only() -> Self {
        Self::new().with_strategy(StructuralHeuristic::new())
    }

    /// Append a strategy to the chain.
    pub fn with_strategy(mut self, strategy: impl PageStrategy + 'static) -> Self {
        self.register(Arc::new(strategy));
        self
    }

    /// Append a shared strategy to the chain.
    pub fn register(&mut self, strategy: Arc<dyn PageStrategy>) {
        self.strategies.push(strategy);
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve one document.
    ///
    /// Requested ordinals missing from the winning strategy's map get
    /// [`DEFAULT_PAGE`]; pages for ordinals that were not requested are dropped.
    pub fn resolve(&self, request: &PageRequest) -> Resolution {
        if request.is_empty() {
            return Resolution::default();
        }

        for strategy in &self.strategies {
            match strategy.resolve(request) {
                Some(found) if !found.is_empty() => {
                    let pages = request
                        .ordinals
                        .iter()
                        .map(|&ordinal| (ordinal, found.get(&ordinal).copied().unwrap_or(DEFAULT_PAGE)))
                        .collect();
                    return Resolution {
                        strategy: Some(strategy.name()),
                        pages,
                    };
                }
                _ => log::info!(
                    "    {} found no pages for {}, falling back",
                    strategy.name(),
                    request.display_name()
                ),
            }
        }

        log::warn!("    No page numbers for {}", request.display_name());
        Resolution::default()
    }

    /// Resolve documents one at a time, smallest file first.
    pub fn resolve_all(&self, requests: Vec<PageRequest>) -> Vec<(PathBuf, Resolution)> {
        let mut sized: Vec<(u64, PageRequest)> = requests
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|r| (r.file_size(), r))
            .collect();
        sized.sort_by_key(|(size, _)| *size);

        let total: usize = sized.iter().map(|(_, r)| r.ordinals.len()).sum();
        log::info!(
            "Getting page numbers for {} documents, {} paragraphs...",
            sized.len(),
            total
        );

        sized
            .into_iter()
            .map(|(size, request)| {
                log::info!(
                    "  {} ({:.1}MB, {} paras)",
                    request.display_name(),
                    size as f64 / (1024.0 * 1024.0),
                    request.ordinals.len()
                );
                let resolution = self.resolve(&request);
                (request.document, resolution)
            })
            .collect()
    }
}

impl std::fmt::Debug for PageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageResolver")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<PageMap>);

    impl PageStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn resolve(&self, _request: &PageRequest) -> Option<PageMap> {
            self.1.clone()
        }
    }

    fn request() -> PageRequest {
        PageRequest::new("doc.docx")
            .with_paragraph(2, "two")
            .with_paragraph(5, "five")
    }

    #[test]
    fn test_first_non_empty_wins() {
        let resolver = PageResolver::new()
            .with_strategy(Fixed("none", None))
            .with_strategy(Fixed("empty", Some(PageMap::new())))
            .with_strategy(Fixed("partial", Some(PageMap::from([(2, 7), (9, 9)]))))
            .with_strategy(Fixed("never", Some(PageMap::from([(2, 1), (5, 1)]))));

        let resolution = resolver.resolve(&request());
        assert_eq!(resolution.strategy, Some("partial"));
        assert_eq!(resolution.pages, PageMap::from([(2, 7), (5, 1)]));
    }

    #[test]
    fn test_all_failed() {
        let resolver = PageResolver::new().with_strategy(Fixed("none", None));
        let resolution = resolver.resolve(&request());
        assert!(!resolution.is_resolved());
        assert!(resolution.pages.is_empty());
    }

    #[test]
    fn test_default_chain_order() {
        let resolver = PageResolver::with_automation(Automation::word());
        assert_eq!(resolver.strategy_names(), vec!["live", "clean-copy", "layout"]);
        assert_eq!(PageResolver::layout_only().strategy_names(), vec!["layout"]);
    }
}
