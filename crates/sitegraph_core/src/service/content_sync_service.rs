//! Content-graph synchronization use-cases.
//!
//! # Responsibility
//! - Reconcile auto-managed edges and external nodes with article links.
//! - Unwrap article anchors when the user deletes the matching edge.
//! - Persist article saves and trigger reconciliation for them.
//!
//! # Invariants
//! - Reconciliation is idempotent: an unchanged article and graph produce
//!   zero mutations.
//! - A single failed store call inside a run is logged and skipped; the
//!   next run re-derives the diff and retries it.
//! - A project without a domain skips link sync entirely.
//! - Node-limit denial never fails a save; it yields a warning.

use crate::links::{
    classify_link, extract_links, normalize_external_url, unwrap_anchors, LinkTarget,
};
use crate::model::article::Article;
use crate::model::edge::{Edge, EdgeType};
use crate::model::node::{ContentNode, NodeId, Position};
use crate::model::project::ProjectId;
use crate::repo::graph_repo::{GraphStore, ProjectRepository, RepoError};
use crate::repo::limit_gate::NodeLimitGate;
use crate::sync::{
    assign_handles, plan_reconciliation, ExternalLinkPlan, ExternalResolution, ReconcileInput,
    SyncSettings,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for failures that prevent an operation from starting.
#[derive(Debug)]
pub enum ContentSyncError {
    /// Source node does not exist.
    SourceNodeNotFound(NodeId),
    /// Source node is an external URL node and owns no article.
    NotContentNode(NodeId),
    /// Owning project does not exist.
    ProjectNotFound(ProjectId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ContentSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNodeNotFound(id) => write!(f, "source node not found: {id}"),
            Self::NotContentNode(id) => write!(f, "node {id} is external and has no article"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContentSyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContentSyncError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NodeNotFound(id) => Self::SourceNodeNotFound(id),
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Mutation counts of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub edges_created: u32,
    pub edges_deleted: u32,
    pub external_nodes_created: u32,
    /// User-visible, non-fatal messages (node-limit denials).
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    /// Total number of graph mutations applied in the run.
    pub fn mutation_count(&self) -> u32 {
        self.edges_created + self.edges_deleted + self.external_nodes_created
    }
}

/// Result of deleting an edge with reverse sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnlinkReport {
    pub content_mutated: bool,
}

/// Result of an explicit article save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub article: Article,
    pub reconcile: ReconcileReport,
}

/// Content sync facade over a graph store and a node-limit gate.
pub struct ContentSyncService<S, G>
where
    S: GraphStore + ProjectRepository,
    G: NodeLimitGate,
{
    store: S,
    gate: G,
    settings: SyncSettings,
}

impl<S, G> ContentSyncService<S, G>
where
    S: GraphStore + ProjectRepository,
    G: NodeLimitGate,
{
    /// Creates a service with default [`SyncSettings`].
    pub fn new(store: S, gate: G) -> Self {
        Self {
            store,
            gate,
            settings: SyncSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Saves article content and reconciles its links.
    ///
    /// The stored content is read before the write so outbound cleanup can
    /// tell "all external links removed" apart from "content never had any".
    ///
    /// # Errors
    /// - `SourceNodeNotFound` / `NotContentNode` for an invalid target node.
    /// - `ProjectNotFound` when the owning project is gone.
    /// - `Repo` when the article itself cannot be read or written.
    pub fn save_article(
        &self,
        node_id: NodeId,
        content: &str,
    ) -> Result<SaveReport, ContentSyncError> {
        let node = self
            .store
            .get_node(node_id)?
            .ok_or(ContentSyncError::SourceNodeNotFound(node_id))?;
        if node.is_external() {
            return Err(ContentSyncError::NotContentNode(node_id));
        }

        let domain = self.store.project_domain(node.project_id)?;
        let external_links_before = self
            .store
            .get_article(node_id)?
            .is_some_and(|article| contains_external_links(&article.content, domain.as_deref()));

        let article = self.store.update_article_content(node_id, content)?;
        let reconcile = self.run_reconciliation(
            node_id,
            node.project_id,
            domain.as_deref(),
            article.content.as_str(),
            external_links_before,
        );

        Ok(SaveReport { article, reconcile })
    }

    /// Reconciles `content` of `source_node_id` against the project graph.
    ///
    /// The currently stored article and the source's existing `Outbound`
    /// edges tell the outbound cleanup guard which external links were
    /// known before this edit, so callers may persist the article first.
    /// Never fails; store errors are logged.
    pub fn reconcile_content_links(
        &self,
        source_node_id: NodeId,
        project_id: ProjectId,
        domain: Option<&str>,
        content: &str,
    ) -> ReconcileReport {
        let external_links_before = match self.store.get_article(source_node_id) {
            Ok(article) => article
                .is_some_and(|article| contains_external_links(&article.content, domain)),
            Err(err) => {
                log_store_failure("get_article", source_node_id, &err);
                false
            }
        };

        self.run_reconciliation(
            source_node_id,
            project_id,
            domain,
            content,
            external_links_before,
        )
    }

    /// Deletes `edge` and unwraps the anchors in the source article that
    /// point at the edge's target.
    ///
    /// Content is rewritten before the edge is removed: if the rewrite
    /// fails the edge survives and document and graph stay consistent.
    /// No matching anchor is a silent no-op.
    ///
    /// # Errors
    /// - `Repo` when the article rewrite or edge deletion fails.
    pub fn remove_edge_and_unlink(&self, edge: &Edge) -> Result<UnlinkReport, ContentSyncError> {
        let content_mutated = self.unlink_edge_target(edge)?;

        match self.store.delete_edge(edge.id) {
            Ok(()) => {}
            Err(RepoError::EdgeNotFound(_)) => {
                debug!(
                    "event=edge_unlink module=sync status=ok edge={} note=already_deleted",
                    edge.id
                );
            }
            Err(err) => return Err(ContentSyncError::Repo(err)),
        }

        info!(
            "event=edge_unlink module=sync status=ok edge={} edge_type={:?} content_mutated={}",
            edge.id, edge.edge_type, content_mutated
        );
        Ok(UnlinkReport { content_mutated })
    }

    fn unlink_edge_target(&self, edge: &Edge) -> Result<bool, ContentSyncError> {
        let Some(domain) = self.store.project_domain(edge.project_id)? else {
            info!(
                "event=edge_unlink module=sync status=skipped reason=missing_domain edge={}",
                edge.id
            );
            return Ok(false);
        };

        let Some(target) = self.store.get_node(edge.target_node_id)? else {
            debug!(
                "event=edge_unlink module=sync status=skipped reason=target_missing edge={}",
                edge.id
            );
            return Ok(false);
        };
        let Some(identity) = TargetIdentity::of(&target) else {
            return Ok(false);
        };

        let Some(article) = self.store.get_article(edge.source_node_id)? else {
            return Ok(false);
        };

        let rewritten = unwrap_anchors(&article.content, |href| {
            identity.matches(&classify_link(href, domain.as_str()))
        });
        let Some(rewritten) = rewritten else {
            debug!(
                "event=edge_unlink module=sync status=skipped reason=no_matching_anchor edge={}",
                edge.id
            );
            return Ok(false);
        };

        self.store
            .update_article_content(edge.source_node_id, rewritten.as_str())?;
        Ok(true)
    }

    fn run_reconciliation(
        &self,
        source_node_id: NodeId,
        project_id: ProjectId,
        domain: Option<&str>,
        content: &str,
        external_links_before: bool,
    ) -> ReconcileReport {
        let started_at = Instant::now();
        let mut report = ReconcileReport::default();

        let Some(domain) = domain.map(str::trim).filter(|value| !value.is_empty()) else {
            info!(
                "event=reconcile module=sync status=skipped reason=missing_domain node={} project={}",
                source_node_id, project_id
            );
            return report;
        };

        let nodes = match self.store.list_nodes(project_id) {
            Ok(nodes) => nodes,
            Err(err) => {
                log_store_failure("list_nodes", source_node_id, &err);
                return report;
            }
        };
        let edges = match self.store.list_edges(source_node_id) {
            Ok(edges) => edges,
            Err(err) => {
                log_store_failure("list_edges", source_node_id, &err);
                return report;
            }
        };

        let input = ReconcileInput {
            source_node_id,
            project_id,
            domain,
            content,
            nodes: &nodes,
            edges: &edges,
            external_links_before,
        };
        let plan = plan_reconciliation(&input, &self.settings);
        if !plan.unresolved_slugs.is_empty() {
            debug!(
                "event=reconcile module=sync status=partial node={} unresolved_slugs={}",
                source_node_id,
                plan.unresolved_slugs.len()
            );
        }

        for edge in &plan.edges_to_delete {
            match self.store.delete_edge(edge.id) {
                Ok(()) => report.edges_deleted += 1,
                Err(RepoError::EdgeNotFound(_)) => {}
                Err(err) => log_store_failure("delete_edge", source_node_id, &err),
            }
        }

        for edge in &plan.internal_edges_to_create {
            match self.store.create_edge(edge) {
                Ok(_) => report.edges_created += 1,
                Err(err) => log_store_failure("create_edge", source_node_id, &err),
            }
        }

        let source_position = nodes
            .iter()
            .find(|node| node.id == source_node_id)
            .and_then(|node| node.position);
        for link in &plan.external_links {
            self.apply_external_link(&input, source_position, link, &mut report);
        }

        info!(
            "event=reconcile module=sync status=ok node={} edges_created={} edges_deleted={} external_nodes_created={} warnings={} outbound_cleanup={} duration_ms={}",
            source_node_id,
            report.edges_created,
            report.edges_deleted,
            report.external_nodes_created,
            report.warnings.len(),
            plan.outbound_cleanup_ran,
            started_at.elapsed().as_millis()
        );
        report
    }

    fn apply_external_link(
        &self,
        input: &ReconcileInput<'_>,
        source_position: Option<Position>,
        link: &ExternalLinkPlan,
        report: &mut ReconcileReport,
    ) {
        let (target_id, target_position) = match link.resolution {
            ExternalResolution::Linked { .. } => return,
            ExternalResolution::MissingEdge { node_id, position } => (node_id, position),
            ExternalResolution::MissingNode => {
                let status = match self.gate.check_node_limit(input.project_id) {
                    Ok(status) => status,
                    Err(err) => {
                        log_store_failure("check_node_limit", input.source_node_id, &err);
                        return;
                    }
                };
                if !status.allowed {
                    warn!(
                        "event=node_limit module=sync status=denied project={} current={} limit={:?} created_in_run={}",
                        input.project_id, status.current, status.limit, report.external_nodes_created
                    );
                    report.warnings.push(format!(
                        "Node limit reached ({} of {}): link to {} stays in the article but was not added to the graph",
                        status.current,
                        status.limit.unwrap_or(status.current),
                        link.href
                    ));
                    return;
                }

                let stagger =
                    self.settings.external_stagger_y * f64::from(report.external_nodes_created);
                let position = source_position.unwrap_or(Position::new(0.0, 0.0)).offset(
                    self.settings.external_offset_x,
                    self.settings.external_offset_y + stagger,
                );
                let node = ContentNode::external(
                    input.project_id,
                    link.anchor_text.as_str(),
                    link.href.as_str(),
                )
                .with_position(position);
                if let Err(err) = self.store.create_node(&node) {
                    log_store_failure("create_node", input.source_node_id, &err);
                    return;
                }
                report.external_nodes_created += 1;
                (node.id, node.position)
            }
        };

        let handles = assign_handles(source_position, target_position);
        let edge = Edge::new(
            input.project_id,
            input.source_node_id,
            target_id,
            EdgeType::Outbound,
            link.edge_label.as_str(),
        )
        .with_handles(handles.source, handles.target);
        match self.store.create_edge(&edge) {
            Ok(_) => report.edges_created += 1,
            Err(err) => log_store_failure("create_edge", input.source_node_id, &err),
        }
    }
}

/// Identity of an edge target as seen through link classification.
enum TargetIdentity {
    Slug(String),
    ExternalKey(String),
}

impl TargetIdentity {
    fn of(node: &ContentNode) -> Option<Self> {
        if let Some(url) = node.url() {
            return Some(Self::ExternalKey(normalize_external_url(url)));
        }
        node.slug().map(|slug| Self::Slug(slug.to_string()))
    }

    fn matches(&self, target: &LinkTarget) -> bool {
        match (self, target) {
            (Self::Slug(slug), LinkTarget::Internal { slug: link_slug }) => slug == link_slug,
            (Self::ExternalKey(key), LinkTarget::External { .. }) => {
                target.external_key().as_deref() == Some(key.as_str())
            }
            _ => false,
        }
    }
}

fn contains_external_links(html: &str, domain: Option<&str>) -> bool {
    let Some(domain) = domain else {
        return false;
    };
    extract_links(html)
        .iter()
        .any(|link| matches!(classify_link(&link.href, domain), LinkTarget::External { .. }))
}

fn log_store_failure(op: &'static str, node_id: NodeId, err: &RepoError) {
    error!(
        "event=graph_store_op module=sync status=error op={} node={} error={}",
        op, node_id, err
    );
}
