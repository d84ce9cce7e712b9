//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use crate::load_balancer::{upstream::Upstream, LoadBalancer};

/// Round-robin selector.
/// Stores an internal counter to rotate through upstreams.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, upstreams: &[Arc<Upstream>]) -> Option<Arc<Upstream>> {
        if upstreams.is_empty() {
            return None;
        }

        // Skip saturated upstreams, at most one full turn
        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = upstreams.len();

        for i in 0..len {
            let index = (start_count + i) % len;
            let upstream = &upstreams[index];
            if upstream.has_capacity() {
                return Some(upstream.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(addr: &str, max: usize) -> Arc<Upstream> {
        Arc::new(Upstream::new(addr.parse().unwrap(), max).unwrap())
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let u1 = upstream("127.0.0.1:8080", 100);
        let u2 = upstream("127.0.0.1:8081", 100);
        let upstreams = vec![u1.clone(), u2.clone()];

        let s1 = lb.next_server(&upstreams).unwrap();
        assert_eq!(s1.addr, u1.addr);

        let s2 = lb.next_server(&upstreams).unwrap();
        assert_eq!(s2.addr, u2.addr);

        let s3 = lb.next_server(&upstreams).unwrap();
        assert_eq!(s3.addr, u1.addr);
    }

    #[test]
    fn test_skips_saturated() {
        let lb = RoundRobin::new();
        let u1 = upstream("127.0.0.1:8080", 1);
        let u2 = upstream("127.0.0.1:8081", 1);
        u1.inc_connections();
        let upstreams = vec![u1, u2.clone()];

        assert_eq!(lb.next_server(&upstreams).unwrap().addr, u2.addr);
        assert_eq!(lb.next_server(&upstreams).unwrap().addr, u2.addr);

        u2.inc_connections();
        assert!(lb.next_server(&upstreams).is_none());
    }
}
