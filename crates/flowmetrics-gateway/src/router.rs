//! Axum router wiring.
//!
//! `/metrics-flow` carries its own CORS layer; ops endpoints do not.

use axum::{routing::get, Router};

use crate::{app_state::AppState, cors, ops, routes::metrics_flow};

pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors::layer(state.metrics_flow().cors(), state.metrics());

    Router::new()
        .route(metrics_flow::PATH, get(metrics_flow::handle).layer(cors_layer))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
