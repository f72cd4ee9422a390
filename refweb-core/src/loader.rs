// Snapshot loader: JSON-lines exports into an in-memory Corpus

use crate::error::{CoreError, Result};
use refweb_graph::{Comment, Corpus, Document, User};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

pub const DOCUMENTS_FILE: &str = "documents.jsonl";
pub const COMMENTS_FILE: &str = "comments.jsonl";
pub const USERS_FILE: &str = "users.jsonl";

/// Load `documents.jsonl`, `comments.jsonl` and (if present) `users.jsonl`
/// from `dir`. Each file is a stream of JSON objects.
pub fn load_corpus(dir: &Path) -> Result<Corpus> {
    let documents: Vec<Document> = read_records(&dir.join(DOCUMENTS_FILE))?;
    let comments: Vec<Comment> = read_records(&dir.join(COMMENTS_FILE))?;

    let users_path = dir.join(USERS_FILE);
    let users: Vec<User> = if users_path.exists() {
        read_records(&users_path)?
    } else {
        debug!("No {} in {}", USERS_FILE, dir.display());
        Vec::new()
    };

    info!(
        "Loaded snapshot from {}: {} documents, {} comments, {} users",
        dir.display(),
        documents.len(),
        comments.len(),
        users.len()
    );

    Ok(Corpus::new(documents, comments, users)?)
}

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<T>()
        .map(|record| {
            record.map_err(|source| CoreError::Snapshot {
                path: path.display().to_string(),
                source,
            })
        })
        .collect()
}
