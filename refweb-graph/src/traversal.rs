// Breadth-first walk over forward references and back-references

use crate::corpus::Corpus;
use crate::model::{Comment, Document};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Which relation a pass collects into each expanded document's neighborhood.
/// The frontier always grows along both relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow `refs`
    Forward,
    /// Follow `pingback`
    Backward,
}

impl Direction {
    fn linked<'d>(&self, doc: &'d Document) -> &'d [String] {
        match self {
            Direction::Forward => &doc.refs,
            Direction::Backward => &doc.pingback,
        }
    }
}

/// Documents and comments reachable from a seed, each unique by id
#[derive(Debug, Default, Clone)]
pub struct Neighborhood<'a> {
    pub documents: Vec<&'a Document>,
    pub comments: Vec<&'a Comment>,
}

impl<'a> Neighborhood<'a> {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document_ids(&self) -> HashSet<&'a str> {
        self.documents.iter().map(|&d| d.id.as_str()).collect()
    }

    pub fn comment_ids(&self) -> HashSet<&'a str> {
        self.comments.iter().map(|&c| c.id.as_str()).collect()
    }

    /// Union with another neighborhood, keeping the first occurrence of each id
    pub fn merge(mut self, other: Neighborhood<'a>) -> Self {
        let mut seen_docs = self.document_ids();
        for doc in other.documents {
            if seen_docs.insert(doc.id.as_str()) {
                self.documents.push(doc);
            }
        }
        let mut seen_comments = self.comment_ids();
        for comment in other.comments {
            if seen_comments.insert(comment.id.as_str()) {
                self.comments.push(comment);
            }
        }
        self
    }

    fn push_document(&mut self, doc: &'a Document, seen: &mut HashSet<&'a str>) {
        if seen.insert(doc.id.as_str()) {
            self.documents.push(doc);
        }
    }

    fn push_comment(&mut self, comment: &'a Comment, seen: &mut HashSet<&'a str>) {
        if seen.insert(comment.id.as_str()) {
            self.comments.push(comment);
        }
    }
}

/// Full reference neighborhood of `seed_id`: a backward pass and a forward
/// pass, unioned. Unknown seeds yield an empty neighborhood.
pub fn traverse<'a>(corpus: &'a Corpus, seed_id: &str, depth: u32) -> Neighborhood<'a> {
    if depth == 0 {
        let mut hood = Neighborhood::default();
        if let Some(seed) = corpus.document(seed_id) {
            hood.documents.push(seed);
            hood.comments.extend(corpus.comments_for(&seed.id));
        }
        return hood;
    }

    let backward = traverse_direction(corpus, seed_id, depth, Direction::Backward);
    let forward = traverse_direction(corpus, seed_id, depth, Direction::Forward);
    let hood = backward.merge(forward);

    debug!(
        "Traversed {} at depth {}: {} documents, {} comments",
        seed_id,
        depth,
        hood.documents.len(),
        hood.comments.len()
    );
    hood
}

/// One directional pass. Each expanded document contributes itself, the
/// existing documents it links to in `direction`, and every comment owned by
/// those documents. A document is expanded at most once.
pub fn traverse_direction<'a>(
    corpus: &'a Corpus,
    seed_id: &str,
    depth: u32,
    direction: Direction,
) -> Neighborhood<'a> {
    let mut hood = Neighborhood::default();
    let mut seen_docs = HashSet::new();
    let mut seen_comments = HashSet::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: VecDeque<String> = VecDeque::from([seed_id.to_string()]);

    for _ in 0..depth {
        let mut next = VecDeque::new();

        while let Some(current) = frontier.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let Some(doc) = corpus.document(&current) else {
                debug!("Skipping unknown document {}", current);
                continue;
            };

            let linked = direction
                .linked(doc)
                .iter()
                .filter_map(|id| corpus.document(id));
            for member in std::iter::once(doc).chain(linked) {
                hood.push_document(member, &mut seen_docs);
                for comment in corpus.comments_for(&member.id) {
                    hood.push_comment(comment, &mut seen_comments);
                }
            }

            next.extend(doc.pingback.iter().cloned());
            next.extend(doc.refs.iter().cloned());
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    hood
}
