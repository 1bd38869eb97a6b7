//! Shared application state for the flowmetrics gateway.

use std::sync::Arc;

use tokio::sync::mpsc;

use flowmetrics_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::FlowMetrics;
use crate::routes::MetricsFlowRoute;
use crate::sinks::{AnalyticsRecord, ChannelAnalytics, Sinks, TracingFlowEvents, TracingParamLog};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    metrics: Arc<FlowMetrics>,
    metrics_flow: MetricsFlowRoute,
}

impl AppState {
    /// Build application state with explicit collaborators.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig, sinks: Sinks, metrics: Arc<FlowMetrics>) -> Result<Self> {
        let metrics_flow = MetricsFlowRoute::new(&cfg, sinks, Arc::clone(&metrics))?;

        if cfg.allowed_metrics_flow_cors_origins.is_empty() {
            tracing::warn!("allowed_metrics_flow_cors_origins is empty, cross-origin calls will be rejected");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                metrics,
                metrics_flow,
            }),
        })
    }

    /// Build state with the production sinks. The returned receiver must be
    /// drained by [`forward_analytics`](crate::sinks::forward_analytics).
    pub fn with_default_sinks(cfg: GatewayConfig) -> Result<(Self, mpsc::Receiver<AnalyticsRecord>)> {
        let metrics = Arc::new(FlowMetrics::default());
        let (analytics, rx) = ChannelAnalytics::new(cfg.server.analytics_queue, Arc::clone(&metrics));
        let sinks = Sinks {
            analytics: Arc::new(analytics),
            flow_events: Arc::new(TracingFlowEvents),
            log: Arc::new(TracingParamLog),
        };
        Ok((Self::new(cfg, sinks, metrics)?, rx))
    }

    pub fn metrics(&self) -> Arc<FlowMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn metrics_flow(&self) -> &MetricsFlowRoute {
        &self.inner.metrics_flow
    }
}
