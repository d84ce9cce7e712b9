//! Upstream abstraction.
//!
//! # Responsibilities
//! - Represent one process serving a backend out of band
//! - Track active connections (for least-connections balancing)
//! - Enforce max connection limits

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// A single upstream server.
#[derive(Debug)]
pub struct Upstream {
    /// The address of the upstream.
    pub addr: SocketAddr,
    /// Pre-calculated base URL for request rewriting.
    pub base_url: Url,
    /// Maximum concurrent connections allowed.
    pub max_connections: usize,
    /// Number of currently active connections.
    pub active_connections: AtomicUsize,
}

impl Upstream {
    pub fn new(addr: SocketAddr, max_connections: usize) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&format!("http://{}", addr))?;
        Ok(Self {
            addr,
            base_url,
            max_connections,
            active_connections: AtomicUsize::new(0),
        })
    }

    pub fn connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn has_capacity(&self) -> bool {
        self.connections() < self.max_connections
    }

    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Reserve a connection slot; `None` when the upstream is at its limit.
    pub fn try_acquire(self: &Arc<Self>) -> Option<UpstreamGuard> {
        let mut prev = self.active_connections.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_connections {
                return None;
            }
            match self.active_connections.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(UpstreamGuard {
            upstream: self.clone(),
        })
    }
}

/// Releases the connection slot on drop.
#[derive(Debug)]
pub struct UpstreamGuard {
    pub upstream: Arc<Upstream>,
}

impl Deref for UpstreamGuard {
    type Target = Upstream;
    fn deref(&self) -> &Self::Target {
        &self.upstream
    }
}

impl Drop for UpstreamGuard {
    fn drop(&mut self) {
        self.upstream.dec_connections();
    }
}
