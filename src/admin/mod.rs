//! Admin API.
//!
//! Read-only views of the live dispatch table, protected by a Bearer token.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::get,
    Router,
};
use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/index", get(get_index))
        .route("/admin/resolve", get(get_resolve))
        .route("/admin/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
