//! Edge domain model.
//!
//! # Invariants
//! - Edges are directed: `source_node_id -> target_node_id`.
//! - `Interlinks`/`Outbound` edges are created and removed only by
//!   reconciliation; all other types are user-managed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::node::NodeId;
use crate::model::project::ProjectId;

/// Stable identifier for graph edges.
pub type EdgeId = Uuid;

/// Relationship type between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Hierarchy,
    Sibling,
    CrossCluster,
    Outbound,
    Backlink,
    /// Internal hyperlink between two content pages.
    Interlinks,
}

impl EdgeType {
    /// Whether reconciliation owns the lifecycle of this edge type.
    pub fn is_auto_managed(self) -> bool {
        matches!(self, Self::Interlinks | Self::Outbound)
    }
}

/// Side of a node where an edge attaches on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    Top,
    Bottom,
    Left,
    Right,
}

impl Handle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Directed typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub project_id: ProjectId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub source_handle: Handle,
    pub target_handle: Handle,
    pub edge_type: EdgeType,
    pub label: String,
}

impl Edge {
    /// Creates an edge with a generated id and default `right -> left` ports.
    pub fn new(
        project_id: ProjectId,
        source_node_id: NodeId,
        target_node_id: NodeId,
        edge_type: EdgeType,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            source_node_id,
            target_node_id,
            source_handle: Handle::Right,
            target_handle: Handle::Left,
            edge_type,
            label: label.into(),
        }
    }

    pub fn with_handles(mut self, source_handle: Handle, target_handle: Handle) -> Self {
        self.source_handle = source_handle;
        self.target_handle = target_handle;
        self
    }
}
