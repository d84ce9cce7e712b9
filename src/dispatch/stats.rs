//! Per-backend dispatch counters for the admin API.
//!
//! Kept outside the dispatch table so counts survive reloads.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::index::BackendId;

#[derive(Debug, Default)]
pub struct DispatchStats {
    total: AtomicU64,
    not_found: AtomicU64,
    per_backend: DashMap<BackendId, u64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub not_found: u64,
    pub per_backend: BTreeMap<String, u64>,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request; `None` means no backend claimed it.
    pub fn record(&self, backend: Option<&BackendId>) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match backend {
            Some(backend) => *self.per_backend.entry(backend.clone()).or_insert(0) += 1,
            None => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            per_backend: self
                .per_backend
                .iter()
                .map(|e| (e.key().to_string(), *e.value()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let stats = DispatchStats::new();
        let sqs = BackendId::new("sqs");
        stats.record(Some(&sqs));
        stats.record(Some(&sqs));
        stats.record(None);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.per_backend.get("sqs"), Some(&2));
    }
}
