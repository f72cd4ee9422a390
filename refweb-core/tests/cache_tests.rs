// Tests for the persistent graph cache

use refweb_core::config::PoolSettings;
use refweb_core::{GraphCache, Store};
use refweb_graph::{CommentNode, DocumentNode, Edge, EdgeLabel, Graph, Node, NodeKind};
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_cache() -> (TempDir, GraphCache) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(&temp_dir.path().join("cache.db"), PoolSettings::default()).unwrap();
    (temp_dir, GraphCache::new(Arc::new(store)))
}

fn document_node(id: &str) -> Node {
    Node::Document(DocumentNode {
        id: id.to_string(),
        label: format!("Title {}", id),
        url: format!("https://example.com/{}", id),
        size_karma: 10.0,
        size_comments: 15.0,
        size_upvotes: 100.0,
        karma: Some(3.5),
        upvote_count: None,
        comment_count: Some(1.0),
    })
}

fn comment_node(id: &str) -> Node {
    Node::Comment(CommentNode {
        id: id.to_string(),
        label: "text".to_string(),
        url: format!("https://www.lesswrong.com/posts/P1/comments/{}", id),
    })
}

fn sample_graph() -> Graph {
    Graph {
        nodes: vec![document_node("P1"), comment_node("C1"), document_node("P2")],
        edges: vec![
            Edge::new("P1", "P2", EdgeLabel::References),
            Edge::new("C1", "P1", EdgeLabel::CommentsOn),
        ],
    }
}

#[test]
fn test_miss_is_none() {
    let (_temp_dir, cache) = create_test_cache();

    assert!(cache.get("Nothing", 1).unwrap().is_none());
    assert!(cache.comments("Nothing", 1).unwrap().is_none());
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_put_then_get_splits_nodes() {
    let (_temp_dir, cache) = create_test_cache();
    let graph = sample_graph();

    let updated_at = cache.put("Title P1", 1, &graph).unwrap();
    let entry = cache.get("Title P1", 1).unwrap().unwrap();

    assert_eq!(entry.name, "Title P1");
    assert_eq!(entry.depth, 1);
    assert_eq!(entry.updated_at, updated_at);
    assert_eq!(entry.document_nodes, vec![document_node("P1"), document_node("P2")]);
    assert_eq!(entry.comment_nodes, vec![comment_node("C1")]);
    assert_eq!(entry.edges, graph.edges);
    assert!(
        entry
            .document_nodes
            .iter()
            .all(|n| n.kind() == NodeKind::Document)
    );
}

#[test]
fn test_upsert_keeps_one_row_and_created_at() {
    let (_temp_dir, cache) = create_test_cache();

    let first = cache.put("Title P1", 2, &sample_graph()).unwrap();
    let created_at = cache.get("Title P1", 2).unwrap().unwrap().created_at;

    let smaller = Graph {
        nodes: vec![document_node("P1")],
        edges: Vec::new(),
    };
    let second = cache.put("Title P1", 2, &smaller).unwrap();

    assert_eq!(cache.len().unwrap(), 1);
    assert!(second >= first);

    let entry = cache.get("Title P1", 2).unwrap().unwrap();
    assert_eq!(entry.created_at, created_at);
    assert_eq!(entry.document_nodes, vec![document_node("P1")]);
    assert!(entry.comment_nodes.is_empty());
    assert!(entry.edges.is_empty());
}

#[test]
fn test_depth_is_part_of_the_key() {
    let (_temp_dir, cache) = create_test_cache();

    cache.put("Title P1", 1, &sample_graph()).unwrap();
    cache.put("Title P1", 2, &Graph::default()).unwrap();

    assert_eq!(cache.len().unwrap(), 2);
    assert_eq!(cache.get("Title P1", 1).unwrap().unwrap().edges.len(), 2);
    assert!(cache.get("Title P1", 2).unwrap().unwrap().edges.is_empty());
}

#[test]
fn test_comments_reads_comment_slice() {
    let (_temp_dir, cache) = create_test_cache();
    cache.put("Title P1", 1, &sample_graph()).unwrap();

    let comments = cache.comments("Title P1", 1).unwrap().unwrap();
    assert_eq!(comments, vec![comment_node("C1")]);
}

#[test]
fn test_purge_matching_is_case_insensitive() {
    let (_temp_dir, cache) = create_test_cache();
    let graph = Graph::default();
    cache.put("Berlin Meetup", 1, &graph).unwrap();
    cache.put("MEETUP notes", 2, &graph).unwrap();
    cache.put("Real post", 1, &graph).unwrap();

    let removed = cache.purge_matching(&["meetup".to_string()]).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(cache.len().unwrap(), 1);
    assert!(cache.get("Real post", 1).unwrap().is_some());
}

#[test]
fn test_purge_treats_wildcards_literally() {
    let (_temp_dir, cache) = create_test_cache();
    cache.put("Real post", 1, &Graph::default()).unwrap();

    let removed = cache
        .purge_matching(&["%".to_string(), "_".to_string(), "  ".to_string()])
        .unwrap();

    assert_eq!(removed, 0);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_purge_folds_non_ascii_case() {
    let (_temp_dir, cache) = create_test_cache();
    let graph = Graph::default();
    cache.put("Rencontre d'ÉTÉ", 1, &graph).unwrap();
    cache.put("Straße notes", 1, &graph).unwrap();
    cache.put("Real post", 1, &graph).unwrap();

    let removed = cache
        .purge_matching(&["été".to_string(), "STRASSE".to_string()])
        .unwrap();

    assert_eq!(removed, 1);
    assert!(cache.get("Rencontre d'ÉTÉ", 1).unwrap().is_none());
    assert!(cache.get("Straße notes", 1).unwrap().is_some());
}
