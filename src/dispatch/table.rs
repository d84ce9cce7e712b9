//! The live dispatch table: index, handlers and dispatch settings.
//!
//! # Responsibilities
//! - Decide which backend serves a request (URL, then signature, then
//!   fallback)
//! - Hand out the backend's handler
//!
//! # Design Decisions
//! - Immutable; a reload builds a new table and swaps it in whole
//! - A fallback backend missing from the index fails construction

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};

use crate::config::DispatchSettings;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::handler::{BackendHandler, HandlerTable, MatchSource};
use crate::dispatch::request::dispatch_url;
use crate::dispatch::scope::{service_url, RequestScope};
use crate::index::{BackendId, IndexError, IndexResult};

/// The backend chosen for a request and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub backend: BackendId,
    pub source: MatchSource,
}

/// Result of routing one request.
#[derive(Debug, Clone)]
pub struct Decision {
    /// `None` when no pattern, signature or fallback claims the request.
    pub target: Option<Target>,
    pub scope: RequestScope,
    pub url: String,
}

#[derive(Debug)]
pub struct DispatchTable {
    dispatcher: Dispatcher,
    handlers: HandlerTable,
    settings: DispatchSettings,
}

impl DispatchTable {
    pub fn new(
        dispatcher: Dispatcher,
        handlers: HandlerTable,
        settings: DispatchSettings,
    ) -> IndexResult<Self> {
        if let Some(fallback) = &settings.fallback_backend {
            if !dispatcher.index().contains_backend(fallback) {
                return Err(IndexError::Configuration {
                    backend: BackendId::new(fallback.as_str()),
                    reason: "fallback backend is not in the pattern index".to_string(),
                });
            }
        }
        for backend in handlers.configured() {
            if !dispatcher.index().contains_backend(backend.as_str()) {
                tracing::warn!(backend = %backend, "Upstreams configured for a backend that is not in the index");
            }
        }
        Ok(Self {
            dispatcher,
            handlers,
            settings,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn handler(&self, backend: &BackendId) -> Arc<dyn BackendHandler> {
        self.handlers.get(backend)
    }

    /// Route a request by its URI and headers.
    pub fn decide(&self, uri: &Uri, headers: &HeaderMap) -> Decision {
        let url = dispatch_url(uri, headers);
        let scope = RequestScope::from_headers(headers, &self.settings);

        let target = self
            .dispatcher
            .resolve(&url)
            .backend()
            .map(|backend| Target {
                backend: backend.clone(),
                source: MatchSource::Url,
            })
            .or_else(|| self.infer_from_signature(&scope))
            .or_else(|| {
                self.settings.fallback_backend.as_ref().map(|backend| Target {
                    backend: BackendId::new(backend.as_str()),
                    source: MatchSource::Fallback,
                })
            });

        Decision { target, scope, url }
    }

    fn infer_from_signature(&self, scope: &RequestScope) -> Option<Target> {
        if !self.settings.infer_from_signature {
            return None;
        }
        let service = scope.signing_service.as_deref()?;
        let url = service_url(service, &scope.region);
        self.dispatcher.resolve(&url).backend().map(|backend| Target {
            backend: backend.clone(),
            source: MatchSource::Signature,
        })
    }
}
