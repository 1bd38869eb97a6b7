//! flowmetrics core: transport-agnostic flow primitives and error types.
//!
//! This crate holds everything the `/metrics-flow` endpoint decides on its own:
//! query-parameter validation, flow id minting and verification, and the
//! event/metrics records handed to analytics collaborators. It carries no HTTP
//! or runtime dependencies so the same logic can be driven from tests, the
//! gateway, or batch tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input surfaces as `FlowMetricsError` or as an `InvalidParam`
//! record, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod flow;

/// Shared result type.
pub use error::{FlowMetricsError, Result};
