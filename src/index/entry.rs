//! Index entry types: backend identifiers and compiled URL patterns.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable string key naming one emulated service backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BackendId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for BackendId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for BackendId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BackendId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A compiled URL base pattern.
///
/// Matching is anchored at the start of the URL only: the raw pattern is
/// wrapped as `^(?:raw)`, so it claims a URL prefix and may stop anywhere
/// unless the raw pattern ends with its own `$`.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compile a raw pattern string.
    pub fn compile(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        // The declared text must parse on its own before it is wrapped
        Regex::new(&source)?;
        let regex = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self { source, regex })
    }

    /// The raw pattern text as declared by the backend.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

/// Two patterns are equal when their sources are; equal sources compile to
/// identical automata.
impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for UrlPattern {}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One (backend, pattern) pair of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternIndexEntry {
    pub backend: BackendId,
    pub pattern: UrlPattern,
}

impl PatternIndexEntry {
    pub fn new(backend: BackendId, pattern: UrlPattern) -> Self {
        Self { backend, pattern }
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}
