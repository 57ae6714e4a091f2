//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `sitegraph_core` linkage.
//! - Run one save/unlink cycle on an in-memory graph with deterministic output.

use sitegraph_core::db::open_db_in_memory;
use sitegraph_core::{
    ContentKind, ContentNode, ContentSyncService, EdgeType, GraphStore, Position, Project,
    ProjectRepository, SqliteGraphRepository, SqliteNodeLimitGate,
};
use std::error::Error;

const DEMO_ARTICLE: &str =
    r#"<p>See <a href="/guide">our guide</a> and <a href="https://external.com/x">this</a>.</p>"#;

fn main() -> Result<(), Box<dyn Error>> {
    println!("sitegraph_core ping={}", sitegraph_core::ping());
    println!("sitegraph_core version={}", sitegraph_core::core_version());

    let conn = open_db_in_memory()?;
    let repo = SqliteGraphRepository::try_new(&conn)?;
    let project = Project::new("Demo", Some("site.com"));
    repo.create_project(&project)?;
    let home = ContentNode::content(project.id, ContentKind::Pillar, "Home", Some("home"))
        .with_position(Position::new(0.0, 0.0));
    let guide = ContentNode::content(project.id, ContentKind::Cluster, "Guide", Some("guide"))
        .with_position(Position::new(400.0, 0.0));
    repo.create_node(&home)?;
    repo.create_node(&guide)?;

    let service = ContentSyncService::new(repo, SqliteNodeLimitGate::new(&conn));
    let saved = service.save_article(home.id, DEMO_ARTICLE)?;
    println!(
        "save edges_created={} edges_deleted={} external_nodes_created={} warnings={}",
        saved.reconcile.edges_created,
        saved.reconcile.edges_deleted,
        saved.reconcile.external_nodes_created,
        saved.reconcile.warnings.len()
    );

    let interlink = service
        .store()
        .list_edges(home.id)?
        .into_iter()
        .find(|edge| edge.edge_type == EdgeType::Interlinks);
    if let Some(edge) = interlink {
        let unlinked = service.remove_edge_and_unlink(&edge)?;
        println!("unlink content_mutated={}", unlinked.content_mutated);
    }

    if let Some(article) = service.store().get_article(home.id)? {
        println!("article {}", article.content);
    }
    Ok(())
}
