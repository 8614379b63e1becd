//! Operator HTTP surface: `/health` and `/proxy`, built on axum and
//! tower-http for thin HTTP adapters over the fetch engine.

pub mod health;
pub mod proxy;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::engine::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub dispatcher: Arc<Dispatcher>,
    pub shutting_down: Arc<AtomicBool>,
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/proxy", get(proxy::handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
