//! Top-level facade crate for flowmetrics.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use flowmetrics_core::*;
}

pub mod gateway {
    pub use flowmetrics_gateway::*;
}
