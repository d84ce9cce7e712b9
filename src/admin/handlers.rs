use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use crate::dispatch::stats::StatsSnapshot;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub index_entries: usize,
    pub backends: usize,
    pub fallback_backend: Option<String>,
}

#[derive(Serialize)]
pub struct IndexEntryView {
    pub backend: String,
    pub pattern: String,
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub url: String,
}

#[derive(Serialize)]
pub struct ResolveView {
    pub url: String,
    pub backend: Option<String>,
    pub pattern: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let table = state.table.load();
    let index = table.dispatcher().index();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        index_entries: index.len(),
        backends: index.backends().len(),
        fallback_backend: table.settings().fallback_backend.clone(),
    })
}

pub async fn get_index(State(state): State<AppState>) -> Json<Vec<IndexEntryView>> {
    let table = state.table.load();
    let entries = table
        .dispatcher()
        .index()
        .iter()
        .map(|e| IndexEntryView {
            backend: e.backend.to_string(),
            pattern: e.pattern.source().to_string(),
        })
        .collect();
    Json(entries)
}

pub async fn get_resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Json<ResolveView> {
    let table = state.table.load();
    let entry = table.dispatcher().resolve_entry(&params.url);
    Json(ResolveView {
        backend: entry.map(|e| e.backend.to_string()),
        pattern: entry.map(|e| e.pattern.source().to_string()),
        url: params.url,
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}
