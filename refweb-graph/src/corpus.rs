use crate::error::{CorpusError, Result};
use crate::model::{Comment, Document, User};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Read-only snapshot of the document corpus with typed lookup indices.
///
/// The indices are built once in [`Corpus::new`]; nothing mutates them
/// afterwards, so a `Corpus` can be shared behind an `Arc` across requests.
#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    comments: Vec<Comment>,
    users: Vec<User>,
    document_index: HashMap<String, usize>,
    name_index: HashMap<String, usize>,
    comments_by_document: HashMap<String, Vec<usize>>,
    user_index: HashMap<String, usize>,
    user_name_index: HashMap<String, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, comments: Vec<Comment>, users: Vec<User>) -> Result<Self> {
        let mut document_index = HashMap::with_capacity(documents.len());
        let mut name_index = HashMap::with_capacity(documents.len());

        for (idx, doc) in documents.iter().enumerate() {
            if doc.id.trim().is_empty() {
                return Err(CorpusError::EmptyId(doc.title.clone()));
            }
            if document_index.insert(doc.id.clone(), idx).is_some() {
                return Err(CorpusError::DuplicateDocument(doc.id.clone()));
            }
            // First document wins when two share a title
            name_index.entry(doc.name().to_string()).or_insert(idx);
        }

        let mut comments = comments;
        let mut seen = HashSet::with_capacity(comments.len());
        let before = comments.len();
        comments.retain(|c| seen.insert(c.id.clone()));
        if comments.len() != before {
            debug!("Dropped {} duplicate comments", before - comments.len());
        }

        let mut comments_by_document: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, comment) in comments.iter().enumerate() {
            comments_by_document
                .entry(comment.post_id.clone())
                .or_default()
                .push(idx);
        }

        let mut user_index = HashMap::with_capacity(users.len());
        let mut user_name_index = HashMap::with_capacity(users.len());
        for (idx, user) in users.iter().enumerate() {
            user_index.entry(user.user_id.clone()).or_insert(idx);
            user_name_index
                .entry(user.display_name.clone())
                .or_insert(idx);
        }

        info!(
            "Corpus loaded: {} documents, {} comments, {} users",
            documents.len(),
            comments.len(),
            users.len()
        );

        Ok(Self {
            documents,
            comments,
            users,
            document_index,
            name_index,
            comments_by_document,
            user_index,
            user_name_index,
        })
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.document_index.get(id).map(|&idx| &self.documents[idx])
    }

    /// Look a document up by its request name (trimmed title)
    pub fn find_by_name(&self, name: &str) -> Option<&Document> {
        self.name_index
            .get(name.trim())
            .map(|&idx| &self.documents[idx])
    }

    /// Comments owned by the given document, in corpus order
    pub fn comments_for<'a>(&'a self, document_id: &str) -> impl Iterator<Item = &'a Comment> + use<'a> {
        self.comments_by_document
            .get(document_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.comments[idx])
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.user_index.get(id).map(|&idx| &self.users[idx])
    }

    pub fn user_by_name(&self, display_name: &str) -> Option<&User> {
        self.user_name_index
            .get(display_name)
            .map(|&idx| &self.users[idx])
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
