//! Flow primitives for the metrics-flow endpoint.
//!
//! - `params`: per-field query validation (continue-on-error).
//! - `token`: flow id minting, signing, and device token verification.
//! - `event`: event/metrics records handed to analytics collaborators.

pub mod event;
pub mod params;
pub mod token;

pub use event::{EventData, FlowEventKind, MetricsData, RequestMeta};
pub use params::{validate_query, InvalidParam, ParamName, Validation, ValidParams};
pub use token::{now_ms, FlowContext, FlowResolution, FlowSigner};
