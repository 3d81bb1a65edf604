//! Page number resolution.
//!
//! Pages are looked up through an ordered chain of [`PageStrategy`]
//! implementations: a live search driven by an automation host, the same
//! search on a re-saved copy, and finally an estimate from the layout hints
//! in the document body.

mod automation;
mod heuristic;
mod request;
mod resolver;
mod strategy;

pub use automation::{
    format_search_keys, parse_results, search_snippet, Automation, AutomationHost, TimeoutPolicy,
    SNIPPET_CHARS,
};
pub use heuristic::{layout_pages, StructuralHeuristic};
pub use request::PageRequest;
pub use resolver::{PageResolver, Resolution, DEFAULT_PAGE};
pub use strategy::{CleanCopyLookup, LiveLookup, PageStrategy};
