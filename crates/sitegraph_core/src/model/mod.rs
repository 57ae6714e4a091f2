//! Content-graph domain model.
//!
//! # Responsibility
//! - Define the node, edge, article and project records shared by the
//!   link synchronization engine and its storage adapters.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A node carries exactly one identity field: `slug` for content nodes,
//!   `url` for external nodes.
//! - Only `Interlinks` and `Outbound` edges are owned by reconciliation.

pub mod article;
pub mod edge;
pub mod node;
pub mod project;
