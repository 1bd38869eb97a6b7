//! Event and metrics records handed to analytics and flow-event collaborators.
//!
//! Records serialise in camelCase and skip absent optional fields, matching
//! what downstream analytics pipelines ingest.

use serde::Serialize;

use super::params::ValidParams;
use super::token::FlowContext;

/// Events emitted by the metrics-flow endpoint.
///
/// Each kind carries two names: one for the analytics pipeline and one for
/// the flow-event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEventKind {
    /// Always emitted once per request.
    Begin,
    /// Emitted when `form_type=email`.
    EnterEmailView,
}

impl FlowEventKind {
    pub fn analytics_type(self) -> &'static str {
        match self {
            FlowEventKind::Begin => "flow.begin",
            FlowEventKind::EnterEmailView => "screen.enter-email",
        }
    }

    pub fn flow_event_type(self) -> &'static str {
        match self {
            FlowEventKind::Begin => "flow.begin",
            FlowEventKind::EnterEmailView => "flow.enter-email.view",
        }
    }

    /// Event record for the analytics pipeline.
    pub fn analytics_event(self, now: u64, flow_begin_time: u64) -> EventData {
        EventData::new(self.analytics_type(), now, flow_begin_time)
    }

    /// Event record for the flow-event log.
    pub fn flow_event(self, now: u64, flow_begin_time: u64) -> EventData {
        EventData::new(self.flow_event_type(), now, flow_begin_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// Epoch millis at emission.
    pub time: u64,
    /// Epoch millis the flow began; offset into the flow is `time - flow_time`.
    pub flow_time: u64,
}

impl EventData {
    pub fn new(event_type: &'static str, now: u64, flow_begin_time: u64) -> Self {
        Self {
            event_type,
            time: now,
            flow_time: flow_begin_time,
        }
    }
}

/// Metrics payload shared by every event of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    pub flow_id: String,
    pub flow_begin_time: u64,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
}

impl MetricsData {
    pub fn new(ctx: &FlowContext, params: &ValidParams) -> Self {
        Self {
            flow_id: ctx.flow_id.clone(),
            flow_begin_time: ctx.flow_begin_time,
            device_id: ctx.device_id.clone(),
            entrypoint: params.entrypoint.clone(),
            form_type: params.form_type.map(|f| f.as_str()),
            service: params.service.clone(),
            utm_campaign: params.utm_campaign.clone(),
            utm_content: params.utm_content.clone(),
            utm_medium: params.utm_medium.clone(),
            utm_source: params.utm_source.clone(),
            utm_term: params.utm_term.clone(),
        }
    }
}

/// Request-derived metadata forwarded alongside every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::flow::params::FormType;

    #[test]
    fn enter_email_names_differ_per_sink() {
        let a = FlowEventKind::EnterEmailView.analytics_event(10, 4);
        let f = FlowEventKind::EnterEmailView.flow_event(10, 4);
        assert_eq!(a.event_type, "screen.enter-email");
        assert_eq!(f.event_type, "flow.enter-email.view");
        assert_eq!(a.flow_time, 4);
        assert_eq!(a.time, f.time);
        assert_eq!(a.flow_time, f.flow_time);
    }

    #[test]
    fn flow_time_is_set_for_a_flow_that_just_began() {
        let e = FlowEventKind::Begin.analytics_event(1_500_000_000_000, 1_500_000_000_000);
        assert_eq!(e.flow_time, 1_500_000_000_000);
        assert_eq!(e.time - e.flow_time, 0);
    }

    #[test]
    fn metrics_serialise_camel_case_and_skip_absent() {
        let ctx = FlowContext {
            flow_id: "f".repeat(64),
            flow_begin_time: 42,
            device_id: "d".repeat(32),
        };
        let params = ValidParams {
            entrypoint: Some("zoo".into()),
            form_type: Some(FormType::Email),
            utm_source: Some("baz".into()),
            ..ValidParams::default()
        };
        let v = serde_json::to_value(MetricsData::new(&ctx, &params)).unwrap();
        assert_eq!(
            v,
            json!({
                "flowId": "f".repeat(64),
                "flowBeginTime": 42,
                "deviceId": "d".repeat(32),
                "entrypoint": "zoo",
                "formType": "email",
                "utmSource": "baz",
            })
        );
    }
}
