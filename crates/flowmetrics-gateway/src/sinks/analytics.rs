//! Fire-and-forget analytics emitter.
//!
//! Request handlers push into a bounded channel with `try_send`; a background
//! task drains it. A full or closed channel drops the record with a warning
//! instead of blocking the request.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use flowmetrics_core::flow::{EventData, MetricsData, RequestMeta};

use super::AnalyticsSink;
use crate::obs::FlowMetrics;

/// One analytics event with its request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsRecord {
    pub event: EventData,
    pub meta: RequestMeta,
    pub metrics: MetricsData,
}

pub struct ChannelAnalytics {
    tx: mpsc::Sender<AnalyticsRecord>,
    metrics: Arc<FlowMetrics>,
}

impl ChannelAnalytics {
    pub fn new(capacity: usize, metrics: Arc<FlowMetrics>) -> (Self, mpsc::Receiver<AnalyticsRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, metrics }, rx)
    }
}

impl AnalyticsSink for ChannelAnalytics {
    fn emit(&self, event: &EventData, meta: &RequestMeta, metrics: &MetricsData) {
        let rec = AnalyticsRecord {
            event: event.clone(),
            meta: meta.clone(),
            metrics: metrics.clone(),
        };
        match self.tx.try_send(rec) {
            Ok(()) => {}
            Err(TrySendError::Full(rec)) => {
                self.metrics.analytics_dropped.inc(&[("reason", "full")]);
                tracing::warn!(event = rec.event.event_type, "analytics queue full, event dropped");
            }
            Err(TrySendError::Closed(rec)) => {
                self.metrics.analytics_dropped.inc(&[("reason", "closed")]);
                tracing::warn!(event = rec.event.event_type, "analytics forwarder gone, event dropped");
            }
        }
    }
}

/// Drain the analytics queue until every sender is dropped.
pub async fn forward_analytics(mut rx: mpsc::Receiver<AnalyticsRecord>) {
    while let Some(rec) = rx.recv().await {
        match serde_json::to_string(&rec) {
            Ok(json) => tracing::info!(
                target: "flowmetrics::amplitude",
                event = rec.event.event_type,
                flow_id = %rec.metrics.flow_id,
                %json
            ),
            Err(e) => tracing::warn!(error = %e, "analytics record serialise failed"),
        }
    }
    tracing::debug!("analytics forwarder stopped");
}
