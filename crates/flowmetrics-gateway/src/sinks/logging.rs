//! `tracing`-backed flow-event log and param log.

use serde::Serialize;

use flowmetrics_core::flow::{EventData, MetricsData, RequestMeta};

use super::{FlowEventSink, InvalidParamRecord, ParamLog};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFlowEvents;

#[derive(Serialize)]
struct FlowEventLine<'a> {
    #[serde(flatten)]
    event: &'a EventData,
    #[serde(flatten)]
    metrics: &'a MetricsData,
    #[serde(flatten)]
    meta: &'a RequestMeta,
}

/// One flat camelCase JSON object per flow event.
fn flow_event_line(
    event: &EventData,
    metrics: &MetricsData,
    meta: &RequestMeta,
) -> serde_json::Result<String> {
    serde_json::to_string(&FlowEventLine { event, metrics, meta })
}

impl FlowEventSink for TracingFlowEvents {
    fn log_flow_event(&self, event: &EventData, metrics: &MetricsData, meta: &RequestMeta) {
        match flow_event_line(event, metrics, meta) {
            Ok(json) => tracing::info!(
                target: "flowmetrics::flow_event",
                op = "flowEvent",
                event = event.event_type,
                flow_id = %metrics.flow_id,
                %json
            ),
            Err(e) => tracing::warn!(error = %e, event = event.event_type, "flow event serialise failed"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingParamLog;

impl ParamLog for TracingParamLog {
    fn info(&self, record: &InvalidParamRecord) {
        tracing::info!(
            op = record.op,
            param = record.param,
            value = %record.value,
            "invalid query parameter dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::{json, Value};

    use flowmetrics_core::flow::{FlowEventKind, InvalidParam, ParamName};

    use super::*;

    fn metrics() -> MetricsData {
        MetricsData {
            flow_id: "f".repeat(64),
            flow_begin_time: 1_500_000_000_000,
            device_id: "d".repeat(32),
            entrypoint: Some("zoo".into()),
            utm_source: Some("baz".into()),
            ..MetricsData::default()
        }
    }

    #[test]
    fn flow_event_line_is_flat_camel_case() {
        let event = FlowEventKind::EnterEmailView.flow_event(1_500_000_000_500, 1_500_000_000_000);
        let meta = RequestMeta {
            user_agent: Some("Firefox/60.0".into()),
            ..RequestMeta::default()
        };

        let line: Value = serde_json::from_str(&flow_event_line(&event, &metrics(), &meta).unwrap()).unwrap();
        assert_eq!(
            line,
            json!({
                "type": "flow.enter-email.view",
                "time": 1_500_000_000_500u64,
                "flowTime": 1_500_000_000_000u64,
                "flowId": "f".repeat(64),
                "flowBeginTime": 1_500_000_000_000u64,
                "deviceId": "d".repeat(32),
                "entrypoint": "zoo",
                "utmSource": "baz",
                "userAgent": "Firefox/60.0",
            })
        );
    }

    #[test]
    fn tracing_sinks_accept_records_without_subscriber() {
        let event = FlowEventKind::Begin.flow_event(2, 1);
        TracingFlowEvents.log_flow_event(&event, &metrics(), &RequestMeta::default());

        let record = InvalidParamRecord::from(&InvalidParam {
            param: ParamName::UtmTerm,
            value: json!("jum!%^gle"),
        });
        assert_eq!(record.param, "utm_term");
        TracingParamLog.info(&record);
    }
}
