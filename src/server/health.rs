//! `GET /health` — a pure read of process state. Always 200; the payload
//! carries whatever state there is.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::ip_pool::PoolStats;
use crate::telemetry::StatsSnapshot;

#[derive(Debug, Serialize)]
struct SessionStats {
    active_sessions: usize,
    cookies_cached: usize,
    earliest_expiry_secs_from_now: Option<u64>,
    refresh_count: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    generated_at: chrono::DateTime<chrono::Utc>,
    stats: StatsSnapshot,
    pool: PoolStats,
    sessions: SessionStats,
    connection_cache_size: usize,
    persona_usage: std::collections::HashMap<&'static str, usize>,
}

pub async fn handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.engine.stats().snapshot();
    let pool = state.engine.pool().stats();
    let bindings = state.engine.bindings();

    let snapshot_bindings = bindings.all_bindings();
    let mut cookies_cached = 0usize;
    let mut refresh_count = 0u64;
    let mut earliest: Option<std::time::Instant> = None;

    for binding in &snapshot_bindings {
        cookies_cached += binding.session.cookie_count().await;
        refresh_count += binding.session.refresh_count();
        if let Some(exp) = binding.session.earliest_expiry().await {
            earliest = Some(earliest.map_or(exp, |cur| cur.min(exp)));
        }
    }

    let now = std::time::Instant::now();
    let sessions = SessionStats {
        active_sessions: snapshot_bindings.len(),
        cookies_cached,
        earliest_expiry_secs_from_now: earliest.map(|e| e.saturating_duration_since(now).as_secs()),
        refresh_count,
    };

    let response = HealthResponse {
        generated_at: chrono::Utc::now(),
        stats,
        pool,
        sessions,
        connection_cache_size: bindings.len(),
        persona_usage: bindings.persona_usage_counts(),
    };

    Json(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
}
