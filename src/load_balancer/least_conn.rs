//! Least Connections load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::{upstream::Upstream, LoadBalancer};

/// Least connections selector.
/// Selects the upstream with the minimum number of active connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, upstreams: &[Arc<Upstream>]) -> Option<Arc<Upstream>> {
        // On a tie the first one wins
        upstreams
            .iter()
            .filter(|u| u.has_capacity())
            .min_by_key(|u| u.connections())
            .cloned()
    }
}
