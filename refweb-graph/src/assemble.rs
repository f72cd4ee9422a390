use crate::corpus::Corpus;
use crate::graph::{CommentNode, DocumentNode, Edge, EdgeLabel, Graph, Node};
use crate::model::{Comment, Document};
use crate::scale::{DocumentSizes, SizeScaler, SizeTable};
use crate::traversal::Neighborhood;
use scraper::Html;
use url::Url;

pub const DEFAULT_PERMALINK_BASE: &str = "https://www.lesswrong.com/";
pub const DEFAULT_EXCERPT_CHARS: usize = 280;

/// Options for configuring graph assembly
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub permalink_base: Url,
    /// Comment labels longer than this many characters are cut
    pub excerpt_chars: usize,
    /// Emit `wrote` edges from resolvable author names to their documents
    pub include_authorship: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            permalink_base: Url::parse(DEFAULT_PERMALINK_BASE)
                .expect("default permalink base is a valid URL"),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            include_authorship: false,
        }
    }
}

/// Turns a traversal neighborhood into typed nodes and edges
pub struct GraphAssembler<'a> {
    corpus: &'a Corpus,
    sizes: &'a SizeTable,
    fallback: DocumentSizes,
    options: AssembleOptions,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(corpus: &'a Corpus, sizes: &'a SizeTable, scaler: &SizeScaler) -> Self {
        Self {
            corpus,
            sizes,
            fallback: DocumentSizes {
                karma: scaler.min_size(),
                comments: scaler.activity_floor(),
                upvotes: scaler.activity_floor(),
            },
            options: AssembleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn assemble(&self, hood: &Neighborhood<'_>) -> Graph {
        let mut graph = Graph::default();

        for doc in &hood.documents {
            graph.nodes.push(Node::Document(self.document_node(doc)));
        }

        // Only the forward relation is rendered
        for doc in &hood.documents {
            for target in &doc.refs {
                graph
                    .edges
                    .push(Edge::new(&doc.id, target, EdgeLabel::References));
            }
        }

        if self.options.include_authorship {
            for doc in &hood.documents {
                for author in &doc.authors {
                    if let Some(user) = self.corpus.user_by_name(author) {
                        graph
                            .edges
                            .push(Edge::new(&user.user_id, &doc.id, EdgeLabel::Wrote));
                    }
                }
            }
        }

        for comment in &hood.comments {
            graph.nodes.push(Node::Comment(self.comment_node(comment)));
        }

        for comment in &hood.comments {
            let edge = match &comment.parent_comment_id {
                Some(parent) => Edge::new(&comment.id, parent, EdgeLabel::RepliesTo),
                None => Edge::new(&comment.id, &comment.post_id, EdgeLabel::CommentsOn),
            };
            graph.edges.push(edge);
        }

        for comment in &hood.comments {
            if let Some(author) = &comment.author_id {
                graph
                    .edges
                    .push(Edge::new(author, &comment.id, EdgeLabel::AuthoredBy));
            }
        }

        graph
    }

    fn document_node(&self, doc: &Document) -> DocumentNode {
        let sizes = self.sizes.get(&doc.id).copied().unwrap_or(self.fallback);
        DocumentNode {
            id: doc.id.clone(),
            label: doc.title.clone(),
            url: doc.url.clone(),
            size_karma: sizes.karma,
            size_comments: sizes.comments,
            size_upvotes: sizes.upvotes,
            karma: doc.karma,
            upvote_count: doc.upvote_count,
            comment_count: doc.comment_count,
        }
    }

    fn comment_node(&self, comment: &Comment) -> CommentNode {
        let body = comment
            .html_body
            .as_deref()
            .map(strip_markup)
            .unwrap_or_default();
        CommentNode {
            id: comment.id.clone(),
            label: excerpt(&body, self.options.excerpt_chars),
            url: permalink(&self.options.permalink_base, comment),
        }
    }
}

/// Drop tags and decode entities, keeping only the text content
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// `{base}/posts/{postId}/comments/{commentId}`, keeping any path on the base
pub fn permalink(base: &Url, comment: &Comment) -> String {
    let mut url = base.clone();
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().extend([
                "posts",
                comment.post_id.as_str(),
                "comments",
                comment.id.as_str(),
            ]);
        }
        Err(()) => {
            return format!(
                "{}/posts/{}/comments/{}",
                base.as_str().trim_end_matches('/'),
                comment.post_id,
                comment.id
            );
        }
    }
    url.to_string()
}
