//! Backend registry.
//!
//! # Responsibilities
//! - Enumerate the backends known at build time
//! - Hand out each backend's URL definitions
//!
//! # Design Decisions
//! - Explicit registration table instead of runtime discovery
//! - Enumeration order is the table order, so builds are reproducible
//! - Listing a backend and defining its URLs are separate steps; a listed
//!   backend without definitions is a configuration error at build time

pub mod builtin;

use std::collections::HashMap;

use crate::config::BackendConfig;
use crate::index::BackendId;

/// URL definitions exported by one backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlDefinitions {
    /// Raw URL base patterns, in declaration order.
    pub url_bases: Vec<String>,
}

impl UrlDefinitions {
    pub fn new<I, S>(url_bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url_bases: url_bases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Source of backends and their URL definitions for the index builder.
pub trait BackendRegistry: Send + Sync {
    /// All known backends in enumeration order.
    fn list_of_backends(&self) -> Vec<BackendId>;

    /// URL definitions for one backend, `None` when it exports none.
    fn url_definitions(&self, backend: &BackendId) -> Option<UrlDefinitions>;
}

/// Registry backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    listed: Vec<BackendId>,
    definitions: HashMap<BackendId, UrlDefinitions>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The emulated services shipped with the dispatcher.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for name in builtin::BUILTIN_BACKENDS {
            registry.list(*name);
        }
        for (name, bases) in builtin::BUILTIN_URL_BASES {
            registry.define(*name, UrlDefinitions::new(bases.iter().copied()));
        }
        registry
    }

    /// Builtin table (optional) overlaid with configured backends.
    ///
    /// A configured backend with URL bases replaces the definitions of a
    /// backend of the same name, keeping its position, or is appended.
    /// Backends configured with upstreams only do not touch the table.
    pub fn from_config(backends: &[BackendConfig], include_builtin: bool) -> Self {
        let mut registry = if include_builtin {
            Self::builtin()
        } else {
            Self::new()
        };
        for backend in backends.iter().filter(|b| !b.url_bases.is_empty()) {
            registry.register(
                backend.name.as_str(),
                UrlDefinitions::new(backend.url_bases.iter().cloned()),
            );
        }
        registry
    }

    /// Add a backend to the enumeration (no-op when already listed).
    pub fn list(&mut self, backend: impl Into<BackendId>) -> &mut Self {
        let backend = backend.into();
        if !self.listed.contains(&backend) {
            self.listed.push(backend);
        }
        self
    }

    /// Set the URL definitions for a backend, replacing earlier ones.
    pub fn define(&mut self, backend: impl Into<BackendId>, definitions: UrlDefinitions) -> &mut Self {
        self.definitions.insert(backend.into(), definitions);
        self
    }

    /// List and define in one step.
    pub fn register(&mut self, backend: impl Into<BackendId>, definitions: UrlDefinitions) -> &mut Self {
        let backend = backend.into();
        self.list(backend.clone());
        self.define(backend, definitions)
    }

    pub fn len(&self) -> usize {
        self.listed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty()
    }
}

impl BackendRegistry for TableRegistry {
    fn list_of_backends(&self) -> Vec<BackendId> {
        self.listed.clone()
    }

    fn url_definitions(&self, backend: &BackendId) -> Option<UrlDefinitions> {
        self.definitions.get(backend).cloned()
    }
}
