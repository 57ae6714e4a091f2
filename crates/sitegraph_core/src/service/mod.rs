//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (editor save hooks, canvas actions) decoupled from
//!   storage details.

pub mod content_sync_service;
