//! URL to backend resolution.
//!
//! # Design Decisions
//! - First match in index order wins; there is no specificity ranking
//! - No match is a value ([`Resolution::NotFound`]), never an error
//! - Holds only an `Arc` to the immutable index, so clones are cheap and
//!   concurrent use needs no locking

use std::sync::Arc;

use crate::index::{BackendId, PatternIndex, PatternIndexEntry};

/// Outcome of resolving one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a BackendId),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn backend(self) -> Option<&'a BackendId> {
        match self {
            Resolution::Found(backend) => Some(backend),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Routes request URLs to backends through a [`PatternIndex`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    index: Arc<PatternIndex>,
}

impl Dispatcher {
    pub fn new(index: Arc<PatternIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &PatternIndex {
        &self.index
    }

    pub fn shared_index(&self) -> Arc<PatternIndex> {
        self.index.clone()
    }

    /// Backend owning `url`, or `NotFound`.
    pub fn resolve(&self, url: &str) -> Resolution<'_> {
        match self.resolve_entry(url) {
            Some(entry) => Resolution::Found(&entry.backend),
            None => Resolution::NotFound,
        }
    }

    /// The first index entry matching `url`.
    pub fn resolve_entry(&self, url: &str) -> Option<&PatternIndexEntry> {
        self.index.iter().find(|entry| entry.matches(url))
    }
}

impl From<PatternIndex> for Dispatcher {
    fn from(index: PatternIndex) -> Self {
        Self::new(Arc::new(index))
    }
}
