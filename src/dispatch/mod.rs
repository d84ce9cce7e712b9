//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (host, path, headers)
//!     → request.rs (scheme://host/path)
//!     → scope.rs (region, account, signing service)
//!     → table.rs
//!         → dispatcher.rs (first-match over the pattern index)
//!         → else signature inference (synthesized service URL)
//!         → else configured fallback
//!     → handler.rs (stub or upstream forwarding)
//! ```
//!
//! # Design Decisions
//! - Deterministic: same index and request always pick the same backend
//! - No match is an explicit outcome, answered 404 by the HTTP layer

pub mod dispatcher;
pub mod handler;
pub mod request;
pub mod scope;
pub mod stats;
pub mod table;

pub use dispatcher::{Dispatcher, Resolution};
pub use handler::{BackendHandler, DispatchContext, HandlerTable, MatchSource, StubHandler, UpstreamHandler};
pub use scope::RequestScope;
pub use stats::DispatchStats;
pub use table::{Decision, DispatchTable, Target};
