//! `GET /metrics-flow`.
//!
//! Resolves (or mints) the flow for the caller, validates the optional query
//! fields one by one, reports `flow.begin` (and `enter-email` for the email
//! form) to the analytics and flow-event sinks, then answers with the flow id
//! and begin time. Invalid fields are logged and dropped; the request itself
//! never fails.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use flowmetrics_core::error::Result;
use flowmetrics_core::flow::{
    now_ms, validate_query, FlowEventKind, FlowSigner, MetricsData, RequestMeta, Validation,
};

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::cors::{CorsOptions, CorsOrigins};
use crate::obs::FlowMetrics;
use crate::sinks::{InvalidParamRecord, Sinks};

pub const METHOD: &str = "get";
pub const PATH: &str = "/metrics-flow";

/// Header carrying `device_id.flow_id.begin_time` from a previous response.
pub const FLOW_TOKEN_HEADER: &str = "x-flow-token";

/// Inbound request as seen by the handler.
#[derive(Debug, Clone, Default)]
pub struct FlowRequest {
    pub headers: HeaderMap,
    pub query: Option<Map<String, Value>>,
}

impl FlowRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn meta(&self) -> RequestMeta {
        RequestMeta {
            user_agent: self.header(header::USER_AGENT.as_str()).map(str::to_string),
            origin: self.header(header::ORIGIN.as_str()).map(str::to_string),
            referer: self.header(header::REFERER.as_str()).map(str::to_string),
        }
    }
}

/// JSON body returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    pub flow_id: String,
    pub flow_begin_time: u64,
    pub device_id: String,
    /// Echo back in `x-flow-token` to resume this flow.
    pub flow_token: String,
}

/// Response side of the handler; `json` is called exactly once per request.
pub trait JsonResponder {
    fn json(&mut self, body: FlowResponse);
}

/// Collects the body so the axum adapter can turn it into a response.
#[derive(Debug, Default)]
struct JsonSlot(Option<FlowResponse>);

impl JsonResponder for JsonSlot {
    fn json(&mut self, body: FlowResponse) {
        self.0 = Some(body);
    }
}

/// The metrics-flow route: descriptor plus handler. Built once from config.
#[derive(Clone)]
pub struct MetricsFlowRoute {
    cors: CorsOptions,
    signer: FlowSigner,
    sinks: Sinks,
    metrics: Arc<FlowMetrics>,
}

impl MetricsFlowRoute {
    pub fn new(cfg: &GatewayConfig, sinks: Sinks, metrics: Arc<FlowMetrics>) -> Result<Self> {
        Ok(Self {
            cors: CorsOptions {
                origin: CorsOrigins::new(cfg.allowed_metrics_flow_cors_origins.iter().cloned()),
                methods: "GET",
            },
            signer: FlowSigner::new(&cfg.flow_id_key, cfg.flow_id_expiry)?,
            sinks,
            metrics,
        })
    }

    pub fn method(&self) -> &'static str {
        METHOD
    }

    pub fn path(&self) -> &'static str {
        PATH
    }

    pub fn cors(&self) -> &CorsOptions {
        &self.cors
    }

    pub fn process<R>(&self, request: &FlowRequest, response: &mut R)
    where
        R: JsonResponder + ?Sized,
    {
        let now = now_ms();
        let user_agent = request.header(header::USER_AGENT.as_str()).unwrap_or_default();

        let flow = self
            .signer
            .resolve(request.header(FLOW_TOKEN_HEADER), user_agent, now);
        self.metrics.flows.inc(&[("kind", flow.kind())]);
        let resolved = flow.kind();
        let ctx = flow.into_context();

        let Validation { valid, invalid } = validate_query(request.query.as_ref());
        for bad in &invalid {
            let record = InvalidParamRecord::from(bad);
            self.metrics.invalid_params.inc(&[("param", record.param)]);
            self.sinks.log.info(&record);
        }

        let meta = request.meta();
        let data = MetricsData::new(&ctx, &valid);

        self.emit(FlowEventKind::Begin, now, &data, &meta);
        if valid.is_email_form() {
            self.emit(FlowEventKind::EnterEmailView, now, &data, &meta);
        }

        tracing::debug!(
            flow_id = %ctx.flow_id,
            flow = resolved,
            invalid = invalid.len(),
            "metrics-flow processed"
        );

        response.json(FlowResponse {
            flow_token: ctx.token(),
            flow_id: ctx.flow_id,
            flow_begin_time: ctx.flow_begin_time,
            device_id: ctx.device_id,
        });
    }

    fn emit(&self, kind: FlowEventKind, now: u64, data: &MetricsData, meta: &RequestMeta) {
        let analytics = kind.analytics_event(now, data.flow_begin_time);
        let flow_event = kind.flow_event(now, data.flow_begin_time);

        self.sinks.analytics.emit(&analytics, meta, data);
        self.sinks.flow_events.log_flow_event(&flow_event, data, meta);
        self.metrics.flow_events.inc(&[("type", flow_event.event_type)]);
    }
}

/// axum adapter: headers + query string -> `process` -> JSON.
pub async fn handle(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let query = (!q.is_empty()).then(|| {
        q.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>()
    });
    let request = FlowRequest { headers, query };

    let mut slot = JsonSlot::default();
    app.metrics_flow().process(&request, &mut slot);

    match slot.0 {
        Some(body) => Json(body).into_response(),
        None => {
            tracing::error!("metrics-flow produced no response body");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal").into_response()
        }
    }
}
