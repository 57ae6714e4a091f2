//! Content-graph synchronization planning.
//!
//! # Responsibility
//! - Choose edge ports from node positions.
//! - Compute reconciliation plans as pure functions of content and graph.
//!
//! # Invariants
//! - Nothing here performs I/O; applying plans is the service layer's job.

pub mod handles;
pub mod plan;
pub mod settings;

pub use handles::{assign_handles, HandlePair};
pub use plan::{
    plan_reconciliation, ExternalLinkPlan, ExternalResolution, ReconcileInput, ReconcilePlan,
};
pub use settings::SyncSettings;
