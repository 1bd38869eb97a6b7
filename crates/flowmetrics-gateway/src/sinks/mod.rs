//! Collaborators the metrics-flow route reports to.
//!
//! The route only sees these traits; implementations are injected at
//! construction so tests can record calls and production can ship events.

pub mod analytics;
pub mod logging;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use flowmetrics_core::flow::{EventData, InvalidParam, MetricsData, RequestMeta};

pub use analytics::{forward_analytics, AnalyticsRecord, ChannelAnalytics};
pub use logging::{TracingFlowEvents, TracingParamLog};

/// `op` tag on every invalid-parameter log record.
pub const INVALID_PARAM_OP: &str = "request.metrics-flow.invalid-param";

/// Analytics pipeline. Called once per emitted event; must not block.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: &EventData, meta: &RequestMeta, metrics: &MetricsData);
}

/// Flow-event log. Called once per emitted event, mirroring the analytics call.
pub trait FlowEventSink: Send + Sync {
    fn log_flow_event(&self, event: &EventData, metrics: &MetricsData, meta: &RequestMeta);
}

/// Structured log for rejected query parameters.
pub trait ParamLog: Send + Sync {
    fn info(&self, record: &InvalidParamRecord);
}

/// Log record for one rejected query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidParamRecord {
    pub op: &'static str,
    pub param: &'static str,
    pub value: Value,
}

impl From<&InvalidParam> for InvalidParamRecord {
    fn from(bad: &InvalidParam) -> Self {
        Self {
            op: INVALID_PARAM_OP,
            param: bad.param.as_str(),
            value: bad.value.clone(),
        }
    }
}

/// The three collaborators bundled for injection.
#[derive(Clone)]
pub struct Sinks {
    pub analytics: Arc<dyn AnalyticsSink>,
    pub flow_events: Arc<dyn FlowEventSink>,
    pub log: Arc<dyn ParamLog>,
}
