//! Resource limit gate for node creation.
//!
//! # Invariants
//! - The check is read-then-act: concurrent writers may each pass it once,
//!   overshooting the limit by at most the number of writers.
//! - A missing limit means the project may grow without bound.

use crate::model::project::ProjectId;
use crate::repo::graph_repo::{RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

/// Answer of one node-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeLimitStatus {
    pub allowed: bool,
    /// Live node count of the project at check time.
    pub current: u32,
    pub limit: Option<u32>,
}

impl NodeLimitStatus {
    pub fn evaluate(current: u32, limit: Option<u32>) -> Self {
        Self {
            allowed: limit.map_or(true, |limit| current < limit),
            current,
            limit,
        }
    }
}

/// Decides whether one more node may be created in a project.
pub trait NodeLimitGate {
    fn check_node_limit(&self, project_id: ProjectId) -> RepoResult<NodeLimitStatus>;
}

/// Gate reading `projects.node_limit` and counting live nodes.
pub struct SqliteNodeLimitGate<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNodeLimitGate<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NodeLimitGate for SqliteNodeLimitGate<'_> {
    fn check_node_limit(&self, project_id: ProjectId) -> RepoResult<NodeLimitStatus> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    node_limit,
                    (SELECT COUNT(*) FROM nodes WHERE project_uuid = projects.uuid)
                 FROM projects
                 WHERE uuid = ?1;",
                [project_id.to_string()],
                |row| Ok((row.get::<_, Option<u32>>(0)?, row.get::<_, u32>(1)?)),
            )
            .optional()?;

        let (limit, current) = row.ok_or(RepoError::ProjectNotFound(project_id))?;
        Ok(NodeLimitStatus::evaluate(current, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::NodeLimitStatus;

    #[test]
    fn evaluate_allows_below_limit_only() {
        assert!(NodeLimitStatus::evaluate(4, Some(5)).allowed);
        assert!(!NodeLimitStatus::evaluate(5, Some(5)).allowed);
        assert!(!NodeLimitStatus::evaluate(6, Some(5)).allowed);
        assert!(NodeLimitStatus::evaluate(10_000, None).allowed);
    }
}
