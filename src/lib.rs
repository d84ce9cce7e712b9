//! Backend dispatcher for a cloud-service emulator.
//!
//! Builds an ordered index of URL base patterns per emulated backend and
//! routes each incoming request to the first backend whose pattern matches.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod index;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;

pub use config::schema::DispatchConfig;
pub use dispatch::{Dispatcher, Resolution};
pub use http::HttpServer;
pub use index::{BackendId, IndexBuilder, IndexError, PatternIndex};
pub use lifecycle::Shutdown;
pub use registry::{BackendRegistry, TableRegistry, UrlDefinitions};
