// Tests for the cache-backed graph engine

use chrono::{Duration, Utc};
use refweb_core::config::{Config, PoolSettings};
use refweb_core::{GraphEngine, ReadMode, Store};
use refweb_graph::{Comment, Corpus, Document, Edge, EdgeLabel, Node};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn doc(id: &str, title: &str, refs: &[&str], pingback: &[&str]) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://example.com/posts/{}", id),
        refs: refs.iter().map(|s| s.to_string()).collect(),
        pingback: pingback.iter().map(|s| s.to_string()).collect(),
        authors: Vec::new(),
        karma: Some(5.0),
        upvote_count: Some(1.0),
        comment_count: Some(0.0),
    }
}

fn comment(id: &str, post: &str) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: post.to_string(),
        parent_comment_id: None,
        author_id: Some("U1".to_string()),
        html_body: Some("<p>hello</p>".to_string()),
    }
}

/// P1 references P2; C1 comments on P1
fn first_corpus() -> Arc<Corpus> {
    Arc::new(
        Corpus::new(
            vec![
                doc("P1", "First", &["P2"], &[]),
                doc("P2", "Second", &[], &["P1"]),
                doc("P3", "Third", &[], &[]),
            ],
            vec![comment("C1", "P1")],
            Vec::new(),
        )
        .unwrap(),
    )
}

/// Same corpus after P1 started citing P3
fn revised_corpus() -> Arc<Corpus> {
    Arc::new(
        Corpus::new(
            vec![
                doc("P1", "First", &["P2", "P3"], &[]),
                doc("P2", "Second", &[], &["P1"]),
                doc("P3", "Third", &[], &["P1"]),
            ],
            vec![comment("C1", "P1")],
            Vec::new(),
        )
        .unwrap(),
    )
}

fn create_test_store() -> (TempDir, Arc<Store>) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(&temp_dir.path().join("engine.db"), PoolSettings::default()).unwrap();
    (temp_dir, Arc::new(store))
}

fn document_ids(nodes: &[Node]) -> HashSet<&str> {
    nodes.iter().map(Node::id).collect()
}

fn cites_third(edges: &[Edge]) -> bool {
    edges.contains(&Edge::new("P1", "P3", EdgeLabel::References))
}

// ============================================================================
// Lookup Tests
// ============================================================================

#[test]
fn test_unknown_name_is_empty_and_not_cached() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store);

    let graph = engine
        .connected_graph("No Such Title", 2, ReadMode::Interactive)
        .unwrap();
    let comments = engine.connected_comments("No Such Title", 2).unwrap();

    assert!(graph.document_nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert!(graph.updated_at.is_none());
    assert!(comments.comment_nodes.is_empty());
    assert_eq!(engine.cache().len().unwrap(), 0);
}

#[test]
fn test_miss_computes_and_caches() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store);

    let graph = engine
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();

    assert_eq!(document_ids(&graph.document_nodes), HashSet::from(["P1", "P2"]));
    assert!(graph.document_nodes.iter().all(|n| matches!(n, Node::Document(_))));
    assert!(graph.edges.contains(&Edge::new("P1", "P2", EdgeLabel::References)));
    assert!(graph.edges.contains(&Edge::new("C1", "P1", EdgeLabel::CommentsOn)));
    assert!(graph.updated_at.is_some());

    let entry = engine.cache().get("First", 1).unwrap().unwrap();
    assert_eq!(Some(entry.updated_at), graph.updated_at);
    assert_eq!(entry.comment_nodes.len(), 1);
}

#[test]
fn test_name_is_matched_trimmed() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store);

    engine
        .connected_graph("  First  ", 1, ReadMode::Interactive)
        .unwrap();

    assert!(engine.cache().get("First", 1).unwrap().is_some());
}

#[test]
fn test_depth_zero_is_seed_and_its_comments() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store);

    let graph = engine
        .connected_graph("First", 0, ReadMode::Interactive)
        .unwrap();
    let comments = engine.connected_comments("First", 0).unwrap();

    assert_eq!(document_ids(&graph.document_nodes), HashSet::from(["P1"]));
    assert_eq!(comments.comment_nodes.len(), 1);
    assert_eq!(comments.comment_nodes[0].id(), "C1");
}

// ============================================================================
// Comment View Tests
// ============================================================================

#[test]
fn test_comments_served_from_cached_entry() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store.clone());
    engine
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();

    // A corpus without comments still sees the cached ones
    let bare = Arc::new(
        Corpus::new(vec![doc("P1", "First", &[], &[])], Vec::new(), Vec::new()).unwrap(),
    );
    let other = GraphEngine::new(bare, store);
    let comments = other.connected_comments("First", 1).unwrap();

    assert_eq!(comments.comment_nodes.len(), 1);
    assert_eq!(comments.comment_nodes[0].id(), "C1");
}

#[test]
fn test_comments_miss_computes_and_caches() {
    let (_temp_dir, store) = create_test_store();
    let engine = GraphEngine::new(first_corpus(), store);

    let comments = engine.connected_comments("First", 1).unwrap();

    assert_eq!(comments.comment_nodes.len(), 1);
    assert_eq!(engine.cache().len().unwrap(), 1);
    assert_eq!(
        engine.cache().get("First", 1).unwrap().unwrap().document_nodes.len(),
        2
    );
}

// ============================================================================
// Freshness Tests
// ============================================================================

#[test]
fn test_interactive_serves_stale_population_refreshes() {
    let (_temp_dir, store) = create_test_store();
    GraphEngine::new(first_corpus(), store.clone())
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();

    let tomorrow = Utc::now() + Duration::days(1);
    let engine =
        GraphEngine::new(revised_corpus(), store).with_clock(Arc::new(move || tomorrow));

    let stale = engine
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();
    assert!(!cites_third(&stale.edges));

    let refreshed = engine
        .connected_graph("First", 1, ReadMode::Population)
        .unwrap();
    assert!(cites_third(&refreshed.edges));
    assert!(document_ids(&refreshed.document_nodes).contains("P3"));

    let after = engine
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();
    assert!(cites_third(&after.edges));
    assert_eq!(engine.cache().len().unwrap(), 1);
}

#[test]
fn test_population_serves_fresh_entry() {
    let (_temp_dir, store) = create_test_store();
    GraphEngine::new(first_corpus(), store.clone())
        .connected_graph("First", 1, ReadMode::Interactive)
        .unwrap();

    let engine = GraphEngine::new(revised_corpus(), store);
    let graph = engine
        .connected_graph("First", 1, ReadMode::Population)
        .unwrap();

    assert!(!cites_third(&graph.edges));
}

// ============================================================================
// Candidate Tests
// ============================================================================

#[test]
fn test_population_candidates_apply_denylist() {
    let (_temp_dir, store) = create_test_store();
    let corpus = Arc::new(
        Corpus::new(
            vec![
                doc("P1", "Alpha", &[], &[]),
                doc("P2", "Berlin MEETUP", &[], &[]),
                doc("P3", " Alpha ", &[], &[]),
                doc("P4", "", &[], &[]),
                doc("P5", "Beta", &[], &[]),
            ],
            Vec::new(),
            Vec::new(),
        )
        .unwrap(),
    );
    let engine = GraphEngine::new(corpus, store);

    assert_eq!(engine.document_names(), vec!["Alpha", "Berlin MEETUP", "Beta"]);
    assert_eq!(
        engine.population_candidates(&["meetup".to_string()]),
        vec!["Alpha", "Beta"]
    );
    assert_eq!(engine.population_candidates(&[]).len(), 3);
}

#[test]
fn test_from_config_applies_sizing() {
    let (_temp_dir, store) = create_test_store();
    let mut config = Config::default();
    config.sizing.min_size = 1.0;
    config.sizing.max_size = 3.0;
    config.sizing.steepness = None;

    let engine = GraphEngine::from_config(first_corpus(), store, &config);
    let graph = engine.compute("P3", 0);

    let Node::Document(node) = &graph.nodes[0] else {
        panic!("expected a document node");
    };
    // Every document has the same karma, so sizes sit at the midpoint
    assert_eq!(node.size_karma, 2.0);
}
