//! Pure reconciliation planner.
//!
//! # Responsibility
//! - Derive the edge/node mutation set that makes a source node's outgoing
//!   auto-managed edges agree with the hyperlinks in its article content.
//!
//! # Invariants
//! - Planning never touches storage; the same input always yields the same
//!   plan.
//! - Planning against a graph produced by applying a previous plan for the
//!   same content yields an empty plan.
//! - User-managed edge types are never scheduled for deletion.
//! - Outbound cleanup runs when external links are known from the content,
//!   the previous article, or existing `Outbound` edges. Blank content only
//!   triggers it through the previous article.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::links::{
    classify_link, extract_links, html_word_count, normalize_external_url, LinkTarget,
};
use crate::model::edge::{Edge, EdgeType};
use crate::model::node::{ContentNode, NodeId, Position};
use crate::model::project::ProjectId;
use crate::sync::handles::assign_handles;
use crate::sync::settings::SyncSettings;

/// Snapshot of everything the planner reads.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub source_node_id: NodeId,
    pub project_id: ProjectId,
    pub domain: &'a str,
    pub content: &'a str,
    /// All nodes of the project.
    pub nodes: &'a [ContentNode],
    /// Existing edges whose source is `source_node_id`.
    pub edges: &'a [Edge],
    /// Whether the content as it was before this edit contained external
    /// links. Together with existing `Outbound` edges this guards outbound
    /// cleanup against unloaded/blank content.
    pub external_links_before: bool,
}

/// How an external link group resolves against the current graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalResolution {
    /// Node exists and the source already has an `Outbound` edge to it.
    Linked { node_id: NodeId },
    /// Node exists but the `Outbound` edge is missing.
    MissingEdge {
        node_id: NodeId,
        position: Option<Position>,
    },
    /// No node with this identity exists yet.
    MissingNode,
}

/// One unique external destination found in content.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalLinkPlan {
    /// Identity key (see `normalize_external_url`).
    pub normalized_url: String,
    /// Literal href of the first occurrence.
    pub href: String,
    /// Anchor text of the first occurrence, used as node title.
    pub anchor_text: String,
    /// Truncated anchor text used as edge label.
    pub edge_label: String,
    pub resolution: ExternalResolution,
}

/// Mutation set computed for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Stale or duplicate auto-managed edges.
    pub edges_to_delete: Vec<Edge>,
    /// `Interlinks` edges ready to be persisted.
    pub internal_edges_to_create: Vec<Edge>,
    /// Unique external destinations in first-occurrence order.
    pub external_links: Vec<ExternalLinkPlan>,
    /// Internal slugs that matched no node in the project.
    pub unresolved_slugs: Vec<String>,
    /// Whether the outbound cleanup pass was allowed to run.
    pub outbound_cleanup_ran: bool,
}

impl ReconcilePlan {
    /// Returns `true` when applying this plan would mutate nothing.
    pub fn is_noop(&self) -> bool {
        self.edges_to_delete.is_empty()
            && self.internal_edges_to_create.is_empty()
            && self
                .external_links
                .iter()
                .all(|link| matches!(link.resolution, ExternalResolution::Linked { .. }))
    }
}

/// Computes the reconciliation plan for one source node.
pub fn plan_reconciliation(input: &ReconcileInput<'_>, settings: &SyncSettings) -> ReconcilePlan {
    let nodes_by_id: HashMap<NodeId, &ContentNode> =
        input.nodes.iter().map(|node| (node.id, node)).collect();
    let source_position = nodes_by_id
        .get(&input.source_node_id)
        .and_then(|node| node.position);

    // First occurrence wins for both internal slugs and external identities.
    let mut internal_links: Vec<(String, String)> = Vec::new();
    let mut seen_slugs: HashSet<String> = HashSet::new();
    let mut external_groups: Vec<(String, String, String)> = Vec::new();
    let mut seen_external: HashSet<String> = HashSet::new();

    for link in extract_links(input.content) {
        match classify_link(link.href.as_str(), input.domain) {
            LinkTarget::Internal { slug } => {
                if seen_slugs.insert(slug.clone()) {
                    internal_links.push((slug, link.anchor_text));
                }
            }
            LinkTarget::External { href } => {
                let key = normalize_external_url(href.as_str());
                if seen_external.insert(key.clone()) {
                    external_groups.push((key, href, link.anchor_text));
                }
            }
        }
    }

    let mut plan = ReconcilePlan::default();
    let mut kept_auto_targets: HashSet<(EdgeType, NodeId)> = HashSet::new();

    let content_loaded = html_word_count(input.content) > 0;
    let outbound_known = input.edges.iter().any(|edge| {
        edge.source_node_id == input.source_node_id && edge.edge_type == EdgeType::Outbound
    });
    plan.outbound_cleanup_ran = !seen_external.is_empty()
        || input.external_links_before
        || (content_loaded && outbound_known);

    // Existing edges are walked once: stale and duplicate auto-managed
    // edges are scheduled for deletion, survivors are indexed.
    for edge in input.edges {
        if edge.source_node_id != input.source_node_id {
            continue;
        }
        let target = nodes_by_id.get(&edge.target_node_id).copied();
        let stale = match edge.edge_type {
            EdgeType::Interlinks => {
                !matches!(target.and_then(ContentNode::slug), Some(slug) if seen_slugs.contains(slug))
            }
            EdgeType::Outbound => {
                plan.outbound_cleanup_ran
                    && !matches!(
                        target.and_then(ContentNode::url),
                        Some(url) if seen_external.contains(&normalize_external_url(url))
                    )
            }
            _ => false,
        };

        if stale {
            plan.edges_to_delete.push(edge.clone());
            continue;
        }
        if edge.edge_type.is_auto_managed()
            && !kept_auto_targets.insert((edge.edge_type, edge.target_node_id))
        {
            plan.edges_to_delete.push(edge.clone());
        }
    }

    let deleted: HashSet<_> = plan.edges_to_delete.iter().map(|edge| edge.id).collect();
    let linked_targets: HashSet<NodeId> = input
        .edges
        .iter()
        .filter(|edge| !deleted.contains(&edge.id))
        .map(|edge| edge.target_node_id)
        .collect();

    let mut nodes_by_slug: BTreeMap<&str, &ContentNode> = BTreeMap::new();
    for node in input.nodes {
        if let Some(slug) = node.slug() {
            nodes_by_slug.entry(slug).or_insert(node);
        }
    }

    for (slug, anchor_text) in internal_links {
        let Some(target) = nodes_by_slug.get(slug.as_str()).copied() else {
            plan.unresolved_slugs.push(slug);
            continue;
        };
        if target.id == input.source_node_id || linked_targets.contains(&target.id) {
            continue;
        }
        let handles = assign_handles(source_position, target.position);
        plan.internal_edges_to_create.push(
            Edge::new(
                input.project_id,
                input.source_node_id,
                target.id,
                EdgeType::Interlinks,
                anchor_text,
            )
            .with_handles(handles.source, handles.target),
        );
    }

    let mut external_by_key: HashMap<String, &ContentNode> = HashMap::new();
    for node in input.nodes {
        if let Some(url) = node.url() {
            external_by_key
                .entry(normalize_external_url(url))
                .or_insert(node);
        }
    }

    for (normalized_url, href, anchor_text) in external_groups {
        let resolution = match external_by_key.get(&normalized_url) {
            Some(node) if kept_auto_targets.contains(&(EdgeType::Outbound, node.id)) => {
                ExternalResolution::Linked { node_id: node.id }
            }
            Some(node) => ExternalResolution::MissingEdge {
                node_id: node.id,
                position: node.position,
            },
            None => ExternalResolution::MissingNode,
        };
        plan.external_links.push(ExternalLinkPlan {
            normalized_url,
            href,
            edge_label: settings.truncate_label(anchor_text.as_str()),
            anchor_text,
            resolution,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::{plan_reconciliation, ExternalResolution, ReconcileInput};
    use crate::model::edge::{Edge, EdgeType, Handle};
    use crate::model::node::{ContentKind, ContentNode, Position};
    use crate::sync::settings::SyncSettings;
    use uuid::Uuid;

    struct Fixture {
        project_id: Uuid,
        source: ContentNode,
        guide: ContentNode,
        pricing: ContentNode,
        external: ContentNode,
    }

    impl Fixture {
        fn new() -> Self {
            let project_id = Uuid::new_v4();
            Self {
                project_id,
                source: ContentNode::content(project_id, ContentKind::Pillar, "Home", Some("home"))
                    .with_position(Position::new(0.0, 0.0)),
                guide: ContentNode::content(
                    project_id,
                    ContentKind::Cluster,
                    "Guide",
                    Some("guide"),
                )
                .with_position(Position::new(400.0, 10.0)),
                pricing: ContentNode::content(
                    project_id,
                    ContentKind::Supporting,
                    "Pricing",
                    Some("pricing"),
                ),
                external: ContentNode::external(project_id, "Ext", "https://external.com/x"),
            }
        }

        fn nodes(&self) -> Vec<ContentNode> {
            vec![
                self.source.clone(),
                self.guide.clone(),
                self.pricing.clone(),
                self.external.clone(),
            ]
        }

        fn edge(&self, target: &ContentNode, edge_type: EdgeType) -> Edge {
            Edge::new(self.project_id, self.source.id, target.id, edge_type, "x")
        }

        fn input<'a>(
            &self,
            content: &'a str,
            nodes: &'a [ContentNode],
            edges: &'a [Edge],
        ) -> ReconcileInput<'a> {
            ReconcileInput {
                source_node_id: self.source.id,
                project_id: self.project_id,
                domain: "site.com",
                content,
                nodes,
                edges,
                external_links_before: false,
            }
        }
    }

    #[test]
    fn creates_one_interlinks_edge_per_target_labeled_by_first_anchor() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let content = r#"<a href="/guide">first</a> <a href="https://site.com/guide/">second</a>"#;
        let plan = plan_reconciliation(&fixture.input(content, &nodes, &[]), &SyncSettings::default());

        assert_eq!(plan.internal_edges_to_create.len(), 1);
        let edge = &plan.internal_edges_to_create[0];
        assert_eq!(edge.target_node_id, fixture.guide.id);
        assert_eq!(edge.edge_type, EdgeType::Interlinks);
        assert_eq!(edge.label, "first");
        assert_eq!((edge.source_handle, edge.target_handle), (Handle::Right, Handle::Left));
    }

    #[test]
    fn stale_interlinks_are_deleted_but_user_edges_survive() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![
            fixture.edge(&fixture.guide, EdgeType::Interlinks),
            fixture.edge(&fixture.pricing, EdgeType::Hierarchy),
            fixture.edge(&fixture.pricing, EdgeType::Backlink),
        ];
        let plan = plan_reconciliation(
            &fixture.input("<p>no links</p>", &nodes, &edges),
            &SyncSettings::default(),
        );

        assert_eq!(plan.edges_to_delete.len(), 1);
        assert_eq!(plan.edges_to_delete[0].id, edges[0].id);
    }

    #[test]
    fn existing_user_edge_blocks_interlinks_creation() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![fixture.edge(&fixture.pricing, EdgeType::Sibling)];
        let plan = plan_reconciliation(
            &fixture.input(r#"<a href="/pricing">p</a>"#, &nodes, &edges),
            &SyncSettings::default(),
        );
        assert!(plan.is_noop());
    }

    #[test]
    fn self_links_and_unknown_slugs_create_nothing() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let plan = plan_reconciliation(
            &fixture.input(r#"<a href="/home">me</a><a href="/missing">gone</a>"#, &nodes, &[]),
            &SyncSettings::default(),
        );
        assert!(plan.internal_edges_to_create.is_empty());
        assert_eq!(plan.unresolved_slugs, vec!["missing".to_string()]);
    }

    #[test]
    fn external_links_group_by_normalized_url() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let content = concat!(
            r#"<a href="https://new.com/page">A</a>"#,
            r#"<a href="http://www.new.com/page/">B</a>"#,
            r#"<a href="http://www.external.com/x/">C</a>"#,
        );
        let plan = plan_reconciliation(&fixture.input(content, &nodes, &[]), &SyncSettings::default());

        assert_eq!(plan.external_links.len(), 2);
        assert_eq!(plan.external_links[0].normalized_url, "new.com/page");
        assert_eq!(plan.external_links[0].href, "https://new.com/page");
        assert_eq!(plan.external_links[0].anchor_text, "A");
        assert_eq!(plan.external_links[0].resolution, ExternalResolution::MissingNode);
        assert_eq!(
            plan.external_links[1].resolution,
            ExternalResolution::MissingEdge {
                node_id: fixture.external.id,
                position: None,
            }
        );
    }

    #[test]
    fn outbound_cleanup_is_skipped_when_no_external_links_are_known() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![fixture.edge(&fixture.external, EdgeType::Outbound)];

        let guarded = plan_reconciliation(&fixture.input("", &nodes, &edges), &SyncSettings::default());
        assert!(!guarded.outbound_cleanup_ran);
        assert!(guarded.edges_to_delete.is_empty());

        let mut input = fixture.input("", &nodes, &edges);
        input.external_links_before = true;
        let cleaned = plan_reconciliation(&input, &SyncSettings::default());
        assert!(cleaned.outbound_cleanup_ran);
        assert_eq!(cleaned.edges_to_delete.len(), 1);
    }

    #[test]
    fn existing_outbound_edges_trigger_cleanup_for_loaded_content() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![
            fixture.edge(&fixture.guide, EdgeType::Interlinks),
            fixture.edge(&fixture.external, EdgeType::Outbound),
        ];

        let plan = plan_reconciliation(
            &fixture.input(r#"<p>Only <a href="/guide">the guide</a> now</p>"#, &nodes, &edges),
            &SyncSettings::default(),
        );
        assert!(plan.outbound_cleanup_ran);
        assert_eq!(plan.edges_to_delete.len(), 1);
        assert_eq!(plan.edges_to_delete[0].id, edges[1].id);

        let blank = plan_reconciliation(
            &fixture.input("<p> </p>", &nodes, &edges[1..]),
            &SyncSettings::default(),
        );
        assert!(!blank.outbound_cleanup_ran);
        assert!(blank.edges_to_delete.is_empty());
    }

    #[test]
    fn duplicate_auto_edges_collapse_to_one() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![
            fixture.edge(&fixture.guide, EdgeType::Interlinks),
            fixture.edge(&fixture.guide, EdgeType::Interlinks),
        ];
        let plan = plan_reconciliation(
            &fixture.input(r#"<a href="/guide">g</a>"#, &nodes, &edges),
            &SyncSettings::default(),
        );
        assert_eq!(plan.edges_to_delete.len(), 1);
        assert_eq!(plan.edges_to_delete[0].id, edges[1].id);
        assert!(plan.internal_edges_to_create.is_empty());
    }

    #[test]
    fn linked_external_targets_make_the_plan_a_noop() {
        let fixture = Fixture::new();
        let nodes = fixture.nodes();
        let edges = vec![
            fixture.edge(&fixture.external, EdgeType::Outbound),
            fixture.edge(&fixture.guide, EdgeType::Interlinks),
        ];
        let content = r#"<a href="/guide">g</a> <a href="external.com/x">x</a>"#;
        let plan = plan_reconciliation(&fixture.input(content, &nodes, &edges), &SyncSettings::default());
        assert!(plan.is_noop(), "unexpected plan: {plan:?}");
    }
}
