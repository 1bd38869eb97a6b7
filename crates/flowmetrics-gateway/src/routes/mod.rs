//! HTTP routes served by the gateway.

pub mod metrics_flow;

pub use metrics_flow::{FlowRequest, FlowResponse, JsonResponder, MetricsFlowRoute};
