//! flowmetrics gateway
//!
//! - `GET /metrics-flow`: flow id + begin time, analytics/flow events
//! - `GET /healthz`, `GET /metrics`: ops
//!
//! Config path comes from `FLOWMETRICS_CONFIG` (default `flowmetrics.yaml`).

use tracing_subscriber::{fmt, EnvFilter};

use flowmetrics_core::error::Result;
use flowmetrics_gateway::{app_state, config, router, sinks};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.client_code().as_str(), "flowmetrics-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let (state, analytics_rx) = app_state::AppState::with_default_sinks(cfg)?;
    tokio::spawn(sinks::forward_analytics(analytics_rx));

    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "flowmetrics-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| flowmetrics_core::FlowMetricsError::Internal(format!("bind failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| flowmetrics_core::FlowMetricsError::Internal(format!("server failed: {e}")))
}
