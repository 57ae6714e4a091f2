//! Content node domain model.
//!
//! # Responsibility
//! - Represent typed graph vertices (content pages and external URLs).
//! - Enforce the slug/url identity split at construction and on decode.
//!
//! # Invariants
//! - `NodeKind::Content` never carries a URL; `NodeKind::External` never
//!   carries a slug.
//! - External URLs are stored verbatim (trimmed); normalization is applied
//!   only when comparing identities.
//! - Slugs never contain whitespace and have no leading/trailing slash.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::project::ProjectId;

/// Stable identifier for graph nodes.
pub type NodeId = Uuid;

/// Flat node type discriminator as exposed to canvas/UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Pillar,
    Cluster,
    Supporting,
    Planned,
    External,
}

/// Role of an internal content page in the site architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Pillar,
    Cluster,
    Supporting,
    Planned,
}

impl From<ContentKind> for NodeType {
    fn from(value: ContentKind) -> Self {
        match value {
            ContentKind::Pillar => Self::Pillar,
            ContentKind::Cluster => Self::Cluster,
            ContentKind::Supporting => Self::Supporting,
            ContentKind::Planned => Self::Planned,
        }
    }
}

/// Editorial status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Draft,
    InProgress,
    Published,
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Identity-bearing node variant.
///
/// The variant decides which identity field exists, so a content node can
/// never be looked up by URL nor an external node by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A page of the project's own site. Planned pages may not have a slug yet.
    Content {
        kind: ContentKind,
        slug: Option<String>,
    },
    /// An off-site URL discovered in article content.
    External { url: String },
}

/// Validation errors for node construction and decode paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValidationError {
    BlankTitle,
    BlankExternalUrl,
    InvalidSlug(String),
    /// Decoded record populated the identity field of the other variant.
    IdentityMismatch {
        node_type: NodeType,
        field: &'static str,
    },
}

impl Display for NodeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "node title must not be blank"),
            Self::BlankExternalUrl => write!(f, "external node url must not be blank"),
            Self::InvalidSlug(slug) => write!(f, "invalid slug `{slug}`"),
            Self::IdentityMismatch { node_type, field } => {
                write!(f, "node type {node_type:?} must not carry `{field}`")
            }
        }
    }
}

impl Error for NodeValidationError {}

/// Typed vertex of a project's content graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct ContentNode {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub kind: NodeKind,
    pub title: String,
    pub status: NodeStatus,
    pub position: Option<Position>,
}

impl ContentNode {
    /// Creates an internal content node with a generated id.
    pub fn content(
        project_id: ProjectId,
        kind: ContentKind,
        title: impl Into<String>,
        slug: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            kind: NodeKind::Content {
                kind,
                slug: slug.map(normalize_slug),
            },
            title: title.into(),
            status: NodeStatus::Draft,
            position: None,
        }
    }

    /// Creates an external URL node with a generated id.
    pub fn external(project_id: ProjectId, title: impl Into<String>, url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            kind: NodeKind::External {
                url: url.trim().to_string(),
            },
            title: title.into(),
            status: NodeStatus::Published,
            position: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Content { kind, .. } => (*kind).into(),
            NodeKind::External { .. } => NodeType::External,
        }
    }

    /// Slug of an internal node; always `None` for external nodes.
    pub fn slug(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Content { slug, .. } => slug.as_deref(),
            NodeKind::External { .. } => None,
        }
    }

    /// Literal URL of an external node; always `None` for content nodes.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Content { .. } => None,
            NodeKind::External { url } => Some(url.as_str()),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.kind, NodeKind::External { .. })
    }

    /// Validates title and identity-field invariants.
    ///
    /// # Errors
    /// - `BlankTitle` when title is empty after trim.
    /// - `BlankExternalUrl` when an external node has no URL text.
    /// - `InvalidSlug` when a slug contains whitespace or edge slashes.
    pub fn validate(&self) -> Result<(), NodeValidationError> {
        if self.title.trim().is_empty() {
            return Err(NodeValidationError::BlankTitle);
        }
        match &self.kind {
            NodeKind::Content {
                slug: Some(slug), ..
            } => {
                if slug.chars().any(char::is_whitespace)
                    || slug.starts_with('/')
                    || slug.ends_with('/')
                {
                    return Err(NodeValidationError::InvalidSlug(slug.clone()));
                }
            }
            NodeKind::Content { slug: None, .. } => {}
            NodeKind::External { url } => {
                if url.trim().is_empty() {
                    return Err(NodeValidationError::BlankExternalUrl);
                }
            }
        }
        Ok(())
    }
}

/// Strips surrounding whitespace and slashes from a slug.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().trim_matches('/').to_string()
}

/// Flat wire/storage shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub node_type: NodeType,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub status: NodeStatus,
    #[serde(default)]
    pub position: Option<Position>,
}

impl TryFrom<NodeRecord> for ContentNode {
    type Error = NodeValidationError;

    fn try_from(value: NodeRecord) -> Result<Self, Self::Error> {
        let kind = match value.node_type {
            NodeType::External => {
                if value.slug.is_some() {
                    return Err(NodeValidationError::IdentityMismatch {
                        node_type: value.node_type,
                        field: "slug",
                    });
                }
                NodeKind::External {
                    url: value.url.unwrap_or_default().trim().to_string(),
                }
            }
            content_type => {
                if value.url.is_some() {
                    return Err(NodeValidationError::IdentityMismatch {
                        node_type: content_type,
                        field: "url",
                    });
                }
                let kind = match content_type {
                    NodeType::Pillar => ContentKind::Pillar,
                    NodeType::Cluster => ContentKind::Cluster,
                    NodeType::Supporting => ContentKind::Supporting,
                    _ => ContentKind::Planned,
                };
                NodeKind::Content {
                    kind,
                    slug: value.slug,
                }
            }
        };

        let node = Self {
            id: value.id,
            project_id: value.project_id,
            kind,
            title: value.title,
            status: value.status,
            position: value.position,
        };
        node.validate()?;
        Ok(node)
    }
}

impl From<ContentNode> for NodeRecord {
    fn from(value: ContentNode) -> Self {
        let node_type = value.node_type();
        let (slug, url) = match value.kind {
            NodeKind::Content { slug, .. } => (slug, None),
            NodeKind::External { url } => (None, Some(url)),
        };
        Self {
            id: value.id,
            project_id: value.project_id,
            node_type,
            title: value.title,
            slug,
            url,
            status: value.status,
            position: value.position,
        }
    }
}
