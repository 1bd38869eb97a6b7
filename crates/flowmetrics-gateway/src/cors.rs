//! CORS origin predicate for `/metrics-flow`.
//!
//! `CorsOrigins` is a pure allow-list check. `layer` plugs the same check
//! into tower-http so preflight and response headers come from the framework.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use flowmetrics_core::error::{FlowMetricsError, Result};

use crate::obs::FlowMetrics;

#[derive(Debug, Clone)]
pub struct CorsOrigins {
    allowed: Arc<[String]>,
}

impl CorsOrigins {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// `Ok(true)` for an allow-listed origin, `FlowMetricsError::Cors` otherwise.
    pub fn check(&self, origin: &str) -> Result<bool> {
        if self.allowed.iter().any(|o| o == origin) {
            Ok(true)
        } else {
            Err(FlowMetricsError::Cors)
        }
    }

    /// Callback form of [`check`](Self::check): `(None, Some(true))` when
    /// allowed, `(Some(err), None)` when rejected. The callback runs before
    /// this returns.
    pub fn origin<F>(&self, origin: &str, callback: F)
    where
        F: FnOnce(Option<FlowMetricsError>, Option<bool>),
    {
        match self.check(origin) {
            Ok(ok) => callback(None, Some(ok)),
            Err(e) => callback(Some(e), None),
        }
    }
}

/// Route-level CORS options: origin predicate plus allowed methods.
#[derive(Debug, Clone)]
pub struct CorsOptions {
    pub origin: CorsOrigins,
    pub methods: &'static str,
}

/// tower-http layer driven by `options`. Rejections are counted.
pub fn layer(options: &CorsOptions, metrics: Arc<FlowMetrics>) -> CorsLayer {
    let origins = options.origin.clone();
    let methods: Vec<Method> = options
        .methods
        .split(',')
        .filter_map(|m| m.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_methods(methods)
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _parts| {
            let Ok(origin) = origin.to_str() else {
                metrics.cors_rejections.inc(&[]);
                return false;
            };
            match origins.check(origin) {
                Ok(allowed) => allowed,
                Err(e) => {
                    metrics.cors_rejections.inc(&[]);
                    tracing::debug!(%origin, error = %e, "metrics-flow origin rejected");
                    false
                }
            }
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins() -> CorsOrigins {
        CorsOrigins::new(["https://mozilla.org"])
    }

    #[test]
    fn allowed_origin_passes() {
        assert!(origins().check("https://mozilla.org").is_ok_and(|ok| ok));
    }

    #[test]
    fn unknown_origin_is_cors_error() {
        let err = origins().check("https://google.com").err();
        assert_eq!(err.map(|e| e.to_string()).as_deref(), Some("CORS Error"));
    }

    #[test]
    fn callback_sequence_does_not_interfere() {
        let cors = origins();
        let mut calls = Vec::new();

        cors.origin("https://google.com", |err, result| {
            calls.push((err.map(|e| e.to_string()), result));
        });
        cors.origin("https://mozilla.org", |err, result| {
            calls.push((err.map(|e| e.to_string()), result));
        });
        cors.origin("https://google.com", |err, result| {
            calls.push((err.map(|e| e.to_string()), result));
        });

        assert_eq!(
            calls,
            vec![
                (Some("CORS Error".to_string()), None),
                (None, Some(true)),
                (Some("CORS Error".to_string()), None),
            ]
        );
    }

    #[test]
    fn origin_match_is_exact() {
        let cors = origins();
        assert!(cors.check("https://mozilla.org/").is_err());
        assert!(cors.check("http://mozilla.org").is_err());
        assert!(cors.check("").is_err());
    }
}
