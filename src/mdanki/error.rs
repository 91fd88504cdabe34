use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdAnkiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to access {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation '{action}' failed: {reason}")]
    Store { action: String, reason: String },

    #[error("Found {count} cards for id '{id}'; ids must be unique in the collection")]
    DuplicateCards { id: String, count: usize },

    #[error("Found no corresponding card for note with id '{id}'")]
    OrphanNote { id: String },

    #[error("{count} card(s) have an empty answer")]
    EmptyAnswers { count: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl MdAnkiError {
    pub(crate) fn store(action: &str, reason: impl Into<String>) -> Self {
        MdAnkiError::Store {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn document(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MdAnkiError::Document {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MdAnkiError>;
