//! Project record as seen by the sync engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for projects.
pub type ProjectId = Uuid;

/// Content-planning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Site domain used to resolve internal links. `None` disables link sync.
    pub domain: Option<String>,
    /// Maximum node count for the project's plan. `None` means unlimited.
    pub node_limit: Option<u32>,
}

impl Project {
    pub fn new(name: impl Into<String>, domain: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            domain: domain
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            node_limit: None,
        }
    }

    pub fn with_node_limit(mut self, limit: u32) -> Self {
        self.node_limit = Some(limit);
        self
    }
}
