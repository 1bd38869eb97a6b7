use std::net::SocketAddr;

use serde::Deserialize;
use serde_json::{json, Value};

use flowmetrics_core::error::{FlowMetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Origins allowed to call `/metrics-flow` cross-origin.
    #[serde(default)]
    pub allowed_metrics_flow_cors_origins: Vec<String>,

    /// HMAC key used to sign flow ids.
    pub flow_id_key: String,

    /// Flow lifetime in millis; older device tokens start a fresh flow.
    #[serde(default = "default_flow_id_expiry")]
    pub flow_id_expiry: u64,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FlowMetricsError::UnsupportedVersion);
        }
        if self.flow_id_key.is_empty() {
            return Err(FlowMetricsError::BadRequest("flow_id_key must not be empty".into()));
        }
        if self.flow_id_expiry == 0 {
            return Err(FlowMetricsError::BadRequest("flow_id_expiry must be greater than 0".into()));
        }
        for origin in &self.allowed_metrics_flow_cors_origins {
            if !(origin.starts_with("https://") || origin.starts_with("http://")) {
                return Err(FlowMetricsError::BadRequest(format!(
                    "allowed_metrics_flow_cors_origins entry must be an http(s) origin: {origin}"
                )));
            }
        }

        self.server.validate()?;

        Ok(())
    }

    /// Key/value view over the route settings, by config key name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "allowed_metrics_flow_cors_origins" => Some(json!(self.allowed_metrics_flow_cors_origins)),
            "flow_id_key" => Some(json!(self.flow_id_key)),
            "flow_id_expiry" => Some(json!(self.flow_id_expiry)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Bounded queue between request handlers and the analytics forwarder.
    #[serde(default = "default_analytics_queue")]
    pub analytics_queue: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            analytics_queue: default_analytics_queue(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=65536).contains(&self.analytics_queue) {
            return Err(FlowMetricsError::BadRequest(
                "server.analytics_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            FlowMetricsError::BadRequest(format!(
                "server.listen must be a valid SocketAddr: {}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:3030".into()
}
fn default_analytics_queue() -> usize {
    1024
}
fn default_flow_id_expiry() -> u64 {
    7_200_000
}
