//! Upstream pool management.
//!
//! # Responsibilities
//! - Hold the upstreams of one backend
//! - Apply the configured balancing strategy
//! - Provide connection guards for tracking

use std::sync::Arc;
use crate::config::{BackendConfig, BalanceStrategy};
use crate::load_balancer::{
    least_conn::LeastConnections,
    round_robin::RoundRobin,
    upstream::{Upstream, UpstreamGuard},
    LoadBalancer,
};

/// Upstreams serving one backend.
#[derive(Debug)]
pub struct UpstreamPool {
    upstreams: Vec<Arc<Upstream>>,
    balancer: Box<dyn LoadBalancer>,
}

impl UpstreamPool {
    pub fn new(upstreams: Vec<Arc<Upstream>>, strategy: BalanceStrategy) -> Self {
        let balancer: Box<dyn LoadBalancer> = match strategy {
            BalanceStrategy::RoundRobin => Box::new(RoundRobin::new()),
            BalanceStrategy::LeastConnections => Box::new(LeastConnections::new()),
        };
        Self { upstreams, balancer }
    }

    /// Pool for a configured backend. Unparseable addresses are skipped with
    /// a warning; validation reports them before this point.
    pub fn from_config(config: &BackendConfig) -> Self {
        let mut upstreams = Vec::new();
        for address in &config.upstreams {
            match address.parse() {
                Ok(addr) => match Upstream::new(addr, config.max_connections) {
                    Ok(upstream) => upstreams.push(Arc::new(upstream)),
                    Err(e) => tracing::warn!(backend = %config.name, address = %address, error = %e, "Invalid upstream URL"),
                },
                Err(_) => tracing::warn!(backend = %config.name, address = %address, "Invalid upstream address"),
            }
        }
        Self::new(upstreams, config.balance)
    }

    /// Select an upstream and reserve a connection slot on it.
    pub fn acquire(&self) -> Option<UpstreamGuard> {
        match self.balancer.next_server(&self.upstreams) {
            Some(upstream) => upstream.try_acquire(),
            None => {
                tracing::debug!(upstream_count = self.upstreams.len(), "No upstream with spare capacity");
                None
            }
        }
    }

    pub fn upstreams(&self) -> &[Arc<Upstream>] {
        &self.upstreams
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_skips_bad_addresses() {
        let config = BackendConfig {
            name: "sqs".into(),
            upstreams: vec!["127.0.0.1:7001".into(), "not-an-address".into()],
            max_connections: 1,
            ..BackendConfig::default()
        };
        let pool = UpstreamPool::from_config(&config);
        assert_eq!(pool.upstreams().len(), 1);

        let guard = pool.acquire().unwrap();
        assert_eq!(guard.addr.port(), 7001);
        assert!(pool.acquire().is_none());
        drop(guard);
        assert!(pool.acquire().is_some());
    }
}
