use sitegraph_core::db::open_db_in_memory;
use sitegraph_core::{
    ContentKind, ContentNode, Edge, EdgeType, GraphStore, Handle, NodeLimitGate, Position,
    Project, ProjectRepository, RepoError, SqliteGraphRepository, SqliteNodeLimitGate,
};

fn project_with_domain(repo: &SqliteGraphRepository<'_>, domain: Option<&str>) -> Project {
    let project = Project::new("Acme", domain);
    repo.create_project(&project).unwrap();
    project
}

#[test]
fn try_new_requires_migrated_schema() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let result = SqliteGraphRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("projects"))));
}

#[test]
fn project_round_trip_and_domain_lookup() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();

    let project = Project::new("Acme", Some("  acme.io ")).with_node_limit(25);
    repo.create_project(&project).unwrap();

    let loaded = repo.get_project(project.id).unwrap().unwrap();
    assert_eq!(loaded, project);
    assert_eq!(loaded.domain.as_deref(), Some("acme.io"));
    assert_eq!(repo.project_domain(project.id).unwrap().as_deref(), Some("acme.io"));

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        repo.project_domain(missing),
        Err(RepoError::ProjectNotFound(id)) if id == missing
    ));
}

#[test]
fn node_round_trip_preserves_identity_and_position() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let project = project_with_domain(&repo, Some("acme.io"));

    let content = ContentNode::content(project.id, ContentKind::Cluster, "Guide", Some("/guide/"))
        .with_position(Position::new(10.0, -4.5));
    let external = ContentNode::external(project.id, "Docs", " https://docs.rs ");
    repo.create_node(&content).unwrap();
    repo.create_node(&external).unwrap();

    let loaded = repo.get_node(content.id).unwrap().unwrap();
    assert_eq!(loaded, content);
    assert_eq!(loaded.slug(), Some("guide"));

    let listed = repo.list_nodes(project.id).unwrap();
    assert_eq!(listed, vec![content, external.clone()]);
    assert_eq!(listed[1].url(), Some("https://docs.rs"));
    assert!(repo.get_node(uuid::Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn slugs_are_unique_per_project_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let first = project_with_domain(&repo, Some("a.com"));
    let second = project_with_domain(&repo, Some("b.com"));

    repo.create_node(&ContentNode::content(first.id, ContentKind::Pillar, "One", Some("home")))
        .unwrap();
    let duplicate = repo.create_node(&ContentNode::content(
        first.id,
        ContentKind::Cluster,
        "Two",
        Some("home"),
    ));
    assert!(matches!(duplicate, Err(RepoError::Db(_))));

    repo.create_node(&ContentNode::content(second.id, ContentKind::Pillar, "Other", Some("home")))
        .unwrap();
    repo.create_node(&ContentNode::content(first.id, ContentKind::Planned, "Idea", None))
        .unwrap();
    repo.create_node(&ContentNode::content(first.id, ContentKind::Planned, "Idea 2", None))
        .unwrap();
}

#[test]
fn create_node_rejects_invalid_nodes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let project = project_with_domain(&repo, None);

    let blank = ContentNode::content(project.id, ContentKind::Pillar, "   ", Some("x"));
    assert!(matches!(repo.create_node(&blank), Err(RepoError::Validation(_))));

    let no_url = ContentNode::external(project.id, "Nowhere", "  ");
    assert!(matches!(repo.create_node(&no_url), Err(RepoError::Validation(_))));
}

#[test]
fn edges_list_in_insertion_order_and_delete_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let project = project_with_domain(&repo, Some("acme.io"));
    let a = ContentNode::content(project.id, ContentKind::Pillar, "A", Some("a"));
    let b = ContentNode::content(project.id, ContentKind::Cluster, "B", Some("b"));
    let c = ContentNode::content(project.id, ContentKind::Cluster, "C", Some("c"));
    for node in [&a, &b, &c] {
        repo.create_node(node).unwrap();
    }

    let first = Edge::new(project.id, a.id, c.id, EdgeType::Interlinks, "see c");
    let second = Edge::new(project.id, a.id, b.id, EdgeType::Hierarchy, "")
        .with_handles(Handle::Bottom, Handle::Top);
    repo.create_edge(&first).unwrap();
    repo.create_edge(&second).unwrap();

    assert_eq!(repo.list_edges(a.id).unwrap(), vec![first.clone(), second]);
    assert!(repo.list_edges(b.id).unwrap().is_empty());

    repo.delete_edge(first.id).unwrap();
    assert!(matches!(
        repo.delete_edge(first.id),
        Err(RepoError::EdgeNotFound(id)) if id == first.id
    ));
}

#[test]
fn deleting_a_node_cascades_to_edges_and_article() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let project = project_with_domain(&repo, Some("acme.io"));
    let a = ContentNode::content(project.id, ContentKind::Pillar, "A", Some("a"));
    let b = ContentNode::content(project.id, ContentKind::Cluster, "B", Some("b"));
    repo.create_node(&a).unwrap();
    repo.create_node(&b).unwrap();
    repo.create_edge(&Edge::new(project.id, a.id, b.id, EdgeType::Interlinks, "b"))
        .unwrap();
    repo.update_article_content(b.id, "<p>b body</p>").unwrap();

    repo.delete_node(b.id).unwrap();
    assert!(repo.list_edges(a.id).unwrap().is_empty());
    assert!(repo.get_article(b.id).unwrap().is_none());
    assert!(matches!(repo.delete_node(b.id), Err(RepoError::NodeNotFound(_))));
}

#[test]
fn article_upsert_recomputes_word_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let project = project_with_domain(&repo, Some("acme.io"));
    let node = ContentNode::content(project.id, ContentKind::Pillar, "A", Some("a"));
    repo.create_node(&node).unwrap();

    assert!(repo.get_article(node.id).unwrap().is_none());
    let first = repo
        .update_article_content(node.id, "<h1>Hello</h1><p>big world</p>")
        .unwrap();
    assert_eq!(first.word_count, 3);

    repo.update_article_content(node.id, "<p>one</p>").unwrap();
    let stored = repo.get_article(node.id).unwrap().unwrap();
    assert_eq!(stored.content, "<p>one</p>");
    assert_eq!(stored.word_count, 1);

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        repo.update_article_content(missing, "x"),
        Err(RepoError::NodeNotFound(id)) if id == missing
    ));
}

#[test]
fn node_limit_gate_counts_live_nodes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGraphRepository::try_new(&conn).unwrap();
    let gate = SqliteNodeLimitGate::new(&conn);

    let limited = Project::new("Limited", Some("l.com")).with_node_limit(2);
    repo.create_project(&limited).unwrap();
    let unlimited = project_with_domain(&repo, Some("u.com"));

    let status = gate.check_node_limit(limited.id).unwrap();
    assert!(status.allowed);
    assert_eq!((status.current, status.limit), (0, Some(2)));

    repo.create_node(&ContentNode::content(limited.id, ContentKind::Pillar, "A", Some("a")))
        .unwrap();
    let external = ContentNode::external(limited.id, "X", "https://x.com");
    repo.create_node(&external).unwrap();
    let status = gate.check_node_limit(limited.id).unwrap();
    assert!(!status.allowed);
    assert_eq!(status.current, 2);

    repo.delete_node(external.id).unwrap();
    assert!(gate.check_node_limit(limited.id).unwrap().allowed);

    let status = gate.check_node_limit(unlimited.id).unwrap();
    assert!(status.allowed);
    assert_eq!(status.limit, None);

    assert!(matches!(
        gate.check_node_limit(uuid::Uuid::new_v4()),
        Err(RepoError::ProjectNotFound(_))
    ));
}
