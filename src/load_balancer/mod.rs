//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Backend resolved → backend has upstreams configured
//!     → pool.rs (upstreams of that backend)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through upstreams)
//!         - least_conn.rs (pick upstream with fewest connections)
//!     → upstream.rs (reserve a connection slot)
//!     → Return guard or no capacity
//! ```
//!
//! # Design Decisions
//! - Balancers are stateless apart from a rotation counter
//! - Algorithm selection per backend
//! - Saturated upstreams excluded from selection

pub mod least_conn;
pub mod pool;
pub mod round_robin;
pub mod upstream;

use std::sync::Arc;
use upstream::Upstream;

/// Upstream selection strategy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next upstream, `None` when none has spare capacity.
    fn next_server(&self, upstreams: &[Arc<Upstream>]) -> Option<Arc<Upstream>>;
}
