use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Comment,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub id: String,
    pub label: String,
    pub url: String,
    pub size_karma: f64,
    pub size_comments: f64,
    pub size_upvotes: f64,
    pub karma: Option<f64>,
    pub upvote_count: Option<f64>,
    pub comment_count: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: String,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Document(DocumentNode),
    Comment(CommentNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Document(n) => &n.id,
            Node::Comment(n) => &n.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Document(n) => &n.label,
            Node::Comment(n) => &n.label,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Comment(_) => NodeKind::Comment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeLabel {
    References,
    RepliesTo,
    CommentsOn,
    AuthoredBy,
    Wrote,
}

impl EdgeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::References => "references",
            EdgeLabel::RepliesTo => "repliesTo",
            EdgeLabel::CommentsOn => "commentsOn",
            EdgeLabel::AuthoredBy => "authoredBy",
            EdgeLabel::Wrote => "wrote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: EdgeLabel,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: EdgeLabel) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label,
        }
    }
}

/// Assembled neighborhood graph. Nodes are unique by id, edges are not
/// deduplicated, and neither collection is ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn document_nodes(&self) -> Vec<Node> {
        self.nodes_of(NodeKind::Document).cloned().collect()
    }

    pub fn comment_nodes(&self) -> Vec<Node> {
        self.nodes_of(NodeKind::Comment).cloned().collect()
    }

    pub fn node_ids(&self, kind: NodeKind) -> HashSet<&str> {
        self.nodes_of(kind).map(Node::id).collect()
    }

    /// Split into (document nodes, comment nodes, edges)
    pub fn into_parts(self) -> (Vec<Node>, Vec<Node>, Vec<Edge>) {
        let (documents, comments) = self
            .nodes
            .into_iter()
            .partition(|n| n.kind() == NodeKind::Document);
        (documents, comments, self.edges)
    }
}
