//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contracts the sync engine consumes (graph store,
//!   project lookup, node-limit gate).
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate node records before persistence.
//! - Repository APIs return semantic errors (`NodeNotFound`, ...) in
//!   addition to DB transport errors.

pub mod graph_repo;
pub mod limit_gate;
