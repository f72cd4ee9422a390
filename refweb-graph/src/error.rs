use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("Document with an empty id (title: {0:?})")]
    EmptyId(String),
}

pub type Result<T> = std::result::Result<T, CorpusError>;
