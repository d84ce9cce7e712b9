//! Backend resolution index.
//!
//! # Data Flow
//! ```text
//! Index build (at startup, on reload, or from the CLI):
//!     BackendRegistry (listed backends + URL definitions)
//!     → builder.rs (rename, exclude, compile)
//!     → PatternIndex (ordered, immutable)
//!     → optionally artifact.rs (JSON snapshot on disk)
//!
//! Request time:
//!     PatternIndex (shared via Arc)
//!     → dispatch::Dispatcher (first-match scan)
//! ```
//!
//! # Design Decisions
//! - Entries keep build order; first match wins
//! - The index is never patched; a registration change means a full rebuild
//! - Excluded backends never enter the index

pub mod artifact;
pub mod builder;
pub mod entry;
pub mod error;
pub mod global;

pub use builder::{ExclusionSet, IndexBuilder};
pub use entry::{BackendId, PatternIndexEntry, UrlPattern};
pub use error::{IndexError, IndexResult};

/// Ordered collection of (backend, pattern) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternIndex {
    entries: Vec<PatternIndexEntry>,
}

impl PatternIndex {
    pub fn new(entries: Vec<PatternIndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PatternIndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternIndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct backends in first-appearance order.
    pub fn backends(&self) -> Vec<&BackendId> {
        let mut seen: Vec<&BackendId> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&&entry.backend) {
                seen.push(&entry.backend);
            }
        }
        seen
    }

    pub fn contains_backend(&self, backend: &str) -> bool {
        self.entries.iter().any(|e| e.backend.as_str() == backend)
    }

    /// Patterns declared by one backend, in index order.
    pub fn patterns_for<'a>(&'a self, backend: &'a str) -> impl Iterator<Item = &'a UrlPattern> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.backend.as_str() == backend)
            .map(|e| &e.pattern)
    }
}

impl<'a> IntoIterator for &'a PatternIndex {
    type Item = &'a PatternIndexEntry;
    type IntoIter = std::slice::Iter<'a, PatternIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
