//! flowmetrics gateway library entry.
//!
//! Wires config, the `/metrics-flow` route, its CORS predicate, the analytics
//! and logging collaborators, and ops endpoints into an axum router. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod cors;
pub mod obs;
pub mod ops;
pub mod router;
pub mod routes;
pub mod sinks;
