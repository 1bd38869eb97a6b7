//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use flowmetrics_core::error::{FlowMetricsError, Result};

pub use schema::{GatewayConfig, ServerSection};

/// Env var naming the config file; falls back to `flowmetrics.yaml`.
pub const CONFIG_ENV: &str = "FLOWMETRICS_CONFIG";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| "flowmetrics.yaml".into())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FlowMetricsError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| FlowMetricsError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
