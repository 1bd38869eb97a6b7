//! Minimal counter registry for the gateway.
//!
//! Counters carry dynamic labels backed by `DashMap`. Labels are flattened
//! into sorted key vectors to keep deterministic ordering.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| {
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (label_str, r.value().load(Ordering::Relaxed))
            })
            .collect();
        rows.sort();
        for (label_str, val) in rows {
            if label_str.is_empty() {
                let _ = writeln!(out, "{} {}", name, val);
            } else {
                let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
            }
        }
    }
}

#[derive(Default)]
pub struct FlowMetrics {
    /// Emitted events, labelled by flow-event type.
    pub flow_events: CounterVec,
    /// Rejected query params, labelled by param name.
    pub invalid_params: CounterVec,
    /// Cross-origin requests from origins outside the allow-list.
    pub cors_rejections: CounterVec,
    /// Resolved flows, labelled `kind=fresh|resumed`.
    pub flows: CounterVec,
    /// Analytics records dropped because the queue was full or closed.
    pub analytics_dropped: CounterVec,
}

impl FlowMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.flow_events.render("flowmetrics_flow_events_total", &mut out);
        self.invalid_params.render("flowmetrics_invalid_params_total", &mut out);
        self.cors_rejections.render("flowmetrics_cors_rejections_total", &mut out);
        self.flows.render("flowmetrics_flows_total", &mut out);
        self.analytics_dropped.render("flowmetrics_analytics_dropped_total", &mut out);
        out
    }
}
