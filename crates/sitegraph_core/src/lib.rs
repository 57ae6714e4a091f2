//! Content-graph synchronization engine.
//!
//! Keeps a project's graph of content nodes consistent with the hyperlinks
//! written into its articles, and rewrites articles when users delete the
//! edges those links produced.

pub mod db;
pub mod links;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use links::{classify_link, extract_links, normalize_external_url, ExtractedLink, LinkTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::Article;
pub use model::edge::{Edge, EdgeId, EdgeType, Handle};
pub use model::node::{
    ContentKind, ContentNode, NodeId, NodeKind, NodeStatus, NodeType, NodeValidationError,
    Position,
};
pub use model::project::{Project, ProjectId};
pub use repo::graph_repo::{
    GraphStore, ProjectRepository, RepoError, RepoResult, SqliteGraphRepository,
};
pub use repo::limit_gate::{NodeLimitGate, NodeLimitStatus, SqliteNodeLimitGate};
pub use service::content_sync_service::{
    ContentSyncError, ContentSyncService, ReconcileReport, SaveReport, UnlinkReport,
};
pub use sync::{assign_handles, HandlePair, SyncSettings};

/// Minimal health-check API for embedding hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
