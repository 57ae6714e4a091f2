//! Graph store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over nodes, edges and articles for the sync engine.
//! - Resolve project metadata (domain) for link classification.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `ContentNode::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Edge listings are returned in insertion order.

use crate::db::DbError;
use crate::model::article::Article;
use crate::model::edge::{Edge, EdgeId, EdgeType, Handle};
use crate::model::node::{
    ContentNode, NodeId, NodeRecord, NodeStatus, NodeType, NodeValidationError, Position,
};
use crate::model::project::{Project, ProjectId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NODE_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    node_type,
    title,
    slug,
    url,
    status,
    position_x,
    position_y
FROM nodes";

const EDGE_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    source_uuid,
    target_uuid,
    source_handle,
    target_handle,
    edge_type,
    label
FROM edges";

const REQUIRED_TABLES: &[&str] = &["projects", "nodes", "edges", "articles"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for graph persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NodeValidationError),
    Db(DbError),
    NodeNotFound(NodeId),
    EdgeNotFound(EdgeId),
    ProjectNotFound(ProjectId),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::EdgeNotFound(id) => write!(f, "edge not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "database is missing required table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted graph data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeValidationError> for RepoError {
    fn from(value: NodeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// CRUD contract consumed by the content sync engine.
pub trait GraphStore {
    fn create_node(&self, node: &ContentNode) -> RepoResult<NodeId>;
    /// Deletes a node; its edges and article cascade.
    fn delete_node(&self, id: NodeId) -> RepoResult<()>;
    fn get_node(&self, id: NodeId) -> RepoResult<Option<ContentNode>>;
    fn create_edge(&self, edge: &Edge) -> RepoResult<EdgeId>;
    fn delete_edge(&self, id: EdgeId) -> RepoResult<()>;
    /// Lists all nodes of a project.
    fn list_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<ContentNode>>;
    /// Lists edges whose source is `source_node_id`, oldest first.
    fn list_edges(&self, source_node_id: NodeId) -> RepoResult<Vec<Edge>>;
    fn get_article(&self, node_id: NodeId) -> RepoResult<Option<Article>>;
    /// Replaces (or creates) the article body of a node and returns the
    /// stored article with a recomputed word count.
    fn update_article_content(&self, node_id: NodeId, html: &str) -> RepoResult<Article>;
}

/// Project lookup contract.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    /// Returns the configured site domain of a project.
    ///
    /// `Ok(None)` means the project exists without a domain.
    fn project_domain(&self, id: ProjectId) -> RepoResult<Option<String>> {
        self.get_project(id)?
            .map(|project| project.domain)
            .ok_or(RepoError::ProjectNotFound(id))
    }
}

/// SQLite-backed graph repository.
pub struct SqliteGraphRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGraphRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the schema has not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(*table));
            }
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }
}

impl GraphStore for SqliteGraphRepository<'_> {
    fn create_node(&self, node: &ContentNode) -> RepoResult<NodeId> {
        node.validate()?;

        let position = node.position;
        self.conn.execute(
            "INSERT INTO nodes (
                uuid,
                project_uuid,
                node_type,
                title,
                slug,
                url,
                status,
                position_x,
                position_y
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                node.id.to_string(),
                node.project_id.to_string(),
                node_type_to_db(node.node_type()),
                node.title.as_str(),
                node.slug(),
                node.url(),
                node_status_to_db(node.status),
                position.map(|p| p.x),
                position.map(|p| p.y),
            ],
        )?;

        Ok(node.id)
    }

    fn delete_node(&self, id: NodeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM nodes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NodeNotFound(id));
        }
        Ok(())
    }

    fn get_node(&self, id: NodeId) -> RepoResult<Option<ContentNode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NODE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_node_row(row)?));
        }
        Ok(None)
    }

    fn create_edge(&self, edge: &Edge) -> RepoResult<EdgeId> {
        self.conn.execute(
            "INSERT INTO edges (
                uuid,
                project_uuid,
                source_uuid,
                target_uuid,
                source_handle,
                target_handle,
                edge_type,
                label
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                edge.id.to_string(),
                edge.project_id.to_string(),
                edge.source_node_id.to_string(),
                edge.target_node_id.to_string(),
                edge.source_handle.as_str(),
                edge.target_handle.as_str(),
                edge_type_to_db(edge.edge_type),
                edge.label.as_str(),
            ],
        )?;
        Ok(edge.id)
    }

    fn delete_edge(&self, id: EdgeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM edges WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::EdgeNotFound(id));
        }
        Ok(())
    }

    fn list_nodes(&self, project_id: ProjectId) -> RepoResult<Vec<ContentNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NODE_SELECT_SQL} WHERE project_uuid = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        Ok(nodes)
    }

    fn list_edges(&self, source_node_id: NodeId) -> RepoResult<Vec<Edge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EDGE_SELECT_SQL} WHERE source_uuid = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([source_node_id.to_string()])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }
        Ok(edges)
    }

    fn get_article(&self, node_id: NodeId) -> RepoResult<Option<Article>> {
        let article = self
            .conn
            .query_row(
                "SELECT content, word_count FROM articles WHERE node_uuid = ?1;",
                [node_id.to_string()],
                |row| {
                    Ok(Article {
                        node_id,
                        content: row.get(0)?,
                        word_count: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(article)
    }

    fn update_article_content(&self, node_id: NodeId, html: &str) -> RepoResult<Article> {
        if !node_exists(self.conn, node_id)? {
            return Err(RepoError::NodeNotFound(node_id));
        }

        let article = Article::new(node_id, html);
        self.conn.execute(
            "INSERT INTO articles (node_uuid, content, word_count)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(node_uuid) DO UPDATE SET
                content = excluded.content,
                word_count = excluded.word_count,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                node_id.to_string(),
                article.content.as_str(),
                article.word_count
            ],
        )?;

        Ok(article)
    }
}

impl ProjectRepository for SqliteGraphRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        if project.name.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "project name must not be blank".to_string(),
            ));
        }
        self.conn.execute(
            "INSERT INTO projects (uuid, name, domain, node_limit) VALUES (?1, ?2, ?3, ?4);",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.domain.as_deref(),
                project.node_limit,
            ],
        )?;
        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                "SELECT name, domain, node_limit FROM projects WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok(Project {
                        id,
                        name: row.get(0)?,
                        domain: row.get(1)?,
                        node_limit: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }
}

fn parse_node_row(row: &Row<'_>) -> RepoResult<ContentNode> {
    let type_text: String = row.get("node_type")?;
    let node_type = parse_node_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid node type `{type_text}` in nodes.node_type"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_node_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid node status `{status_text}` in nodes.status"))
    })?;

    let position = match (
        row.get::<_, Option<f64>>("position_x")?,
        row.get::<_, Option<f64>>("position_y")?,
    ) {
        (Some(x), Some(y)) => Some(Position::new(x, y)),
        _ => None,
    };

    let record = NodeRecord {
        id: parse_uuid(row, "uuid", "nodes.uuid")?,
        project_id: parse_uuid(row, "project_uuid", "nodes.project_uuid")?,
        node_type,
        title: row.get("title")?,
        slug: row.get("slug")?,
        url: row.get("url")?,
        status,
        position,
    };
    ContentNode::try_from(record)
        .map_err(|err| RepoError::InvalidData(format!("invalid node row: {err}")))
}

fn parse_edge_row(row: &Row<'_>) -> RepoResult<Edge> {
    let type_text: String = row.get("edge_type")?;
    let edge_type = parse_edge_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid edge type `{type_text}` in edges.edge_type"))
    })?;

    Ok(Edge {
        id: parse_uuid(row, "uuid", "edges.uuid")?,
        project_id: parse_uuid(row, "project_uuid", "edges.project_uuid")?,
        source_node_id: parse_uuid(row, "source_uuid", "edges.source_uuid")?,
        target_node_id: parse_uuid(row, "target_uuid", "edges.target_uuid")?,
        source_handle: parse_handle(row, "source_handle")?,
        target_handle: parse_handle(row, "target_handle")?,
        edge_type,
        label: row.get("label")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, location: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {location}")))
}

fn parse_handle(row: &Row<'_>, column: &str) -> RepoResult<Handle> {
    let text: String = row.get(column)?;
    Handle::parse(&text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid handle `{text}` in edges.{column}"))
    })
}

fn node_type_to_db(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Pillar => "pillar",
        NodeType::Cluster => "cluster",
        NodeType::Supporting => "supporting",
        NodeType::Planned => "planned",
        NodeType::External => "external",
    }
}

fn parse_node_type(value: &str) -> Option<NodeType> {
    match value {
        "pillar" => Some(NodeType::Pillar),
        "cluster" => Some(NodeType::Cluster),
        "supporting" => Some(NodeType::Supporting),
        "planned" => Some(NodeType::Planned),
        "external" => Some(NodeType::External),
        _ => None,
    }
}

fn node_status_to_db(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Draft => "draft",
        NodeStatus::InProgress => "in_progress",
        NodeStatus::Published => "published",
    }
}

fn parse_node_status(value: &str) -> Option<NodeStatus> {
    match value {
        "draft" => Some(NodeStatus::Draft),
        "in_progress" => Some(NodeStatus::InProgress),
        "published" => Some(NodeStatus::Published),
        _ => None,
    }
}

fn edge_type_to_db(edge_type: EdgeType) -> &'static str {
    match edge_type {
        EdgeType::Hierarchy => "hierarchy",
        EdgeType::Sibling => "sibling",
        EdgeType::CrossCluster => "cross_cluster",
        EdgeType::Outbound => "outbound",
        EdgeType::Backlink => "backlink",
        EdgeType::Interlinks => "interlinks",
    }
}

fn parse_edge_type(value: &str) -> Option<EdgeType> {
    match value {
        "hierarchy" => Some(EdgeType::Hierarchy),
        "sibling" => Some(EdgeType::Sibling),
        "cross_cluster" => Some(EdgeType::CrossCluster),
        "outbound" => Some(EdgeType::Outbound),
        "backlink" => Some(EdgeType::Backlink),
        "interlinks" => Some(EdgeType::Interlinks),
        _ => None,
    }
}

fn node_exists(conn: &Connection, node_id: NodeId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM nodes WHERE uuid = ?1);",
        [node_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
