//! Recording collaborators shared by gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use flowmetrics_core::flow::{EventData, MetricsData, RequestMeta};
use flowmetrics_gateway::config::{self, GatewayConfig};
use flowmetrics_gateway::obs::FlowMetrics;
use flowmetrics_gateway::routes::{FlowResponse, JsonResponder, MetricsFlowRoute};
use flowmetrics_gateway::sinks::{AnalyticsSink, FlowEventSink, InvalidParamRecord, ParamLog, Sinks};

pub const CONFIG: &str = r#"
version: 1
allowed_metrics_flow_cors_origins: ["https://mozilla.org"]
flow_id_key: "foo"
flow_id_expiry: 7200000
"#;

pub fn test_config() -> GatewayConfig {
    config::load_from_str(CONFIG).expect("test config must parse")
}

#[derive(Default)]
pub struct Recorder {
    pub analytics: Mutex<Vec<(EventData, RequestMeta, MetricsData)>>,
    pub flow_events: Mutex<Vec<(EventData, MetricsData, RequestMeta)>>,
    pub logs: Mutex<Vec<InvalidParamRecord>>,
}

impl Recorder {
    pub fn analytics(&self) -> Vec<(EventData, RequestMeta, MetricsData)> {
        self.analytics.lock().unwrap().clone()
    }
    pub fn flow_events(&self) -> Vec<(EventData, MetricsData, RequestMeta)> {
        self.flow_events.lock().unwrap().clone()
    }
    pub fn logs(&self) -> Vec<InvalidParamRecord> {
        self.logs.lock().unwrap().clone()
    }
}

impl AnalyticsSink for Recorder {
    fn emit(&self, event: &EventData, meta: &RequestMeta, metrics: &MetricsData) {
        self.analytics
            .lock()
            .unwrap()
            .push((event.clone(), meta.clone(), metrics.clone()));
    }
}

impl FlowEventSink for Recorder {
    fn log_flow_event(&self, event: &EventData, metrics: &MetricsData, meta: &RequestMeta) {
        self.flow_events
            .lock()
            .unwrap()
            .push((event.clone(), metrics.clone(), meta.clone()));
    }
}

impl ParamLog for Recorder {
    fn info(&self, record: &InvalidParamRecord) {
        self.logs.lock().unwrap().push(record.clone());
    }
}

pub fn sinks(rec: &Arc<Recorder>) -> Sinks {
    Sinks {
        analytics: Arc::clone(rec) as Arc<dyn AnalyticsSink>,
        flow_events: Arc::clone(rec) as Arc<dyn FlowEventSink>,
        log: Arc::clone(rec) as Arc<dyn ParamLog>,
    }
}

pub fn route() -> (MetricsFlowRoute, Arc<Recorder>, Arc<FlowMetrics>) {
    let rec = Arc::new(Recorder::default());
    let metrics = Arc::new(FlowMetrics::default());
    let route = MetricsFlowRoute::new(&test_config(), sinks(&rec), Arc::clone(&metrics))
        .expect("route must build");
    (route, rec, metrics)
}

/// Response spy: records every `json` call.
#[derive(Default)]
pub struct SpyResponse {
    pub calls: Vec<FlowResponse>,
}

impl JsonResponder for SpyResponse {
    fn json(&mut self, body: FlowResponse) {
        self.calls.push(body);
    }
}
