//! Error types for Mizan

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MizanError {
    #[error("Unknown root: {0}")]
    UnknownRoot(String),

    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Unknown transformation group: {0}")]
    UnknownGroup(String),

    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    #[error("Root must have exactly three letters: {0}")]
    RootLength(String),

    #[error("Invalid transformation group key: {0}")]
    InvalidKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for MizanError {
    fn from(e: rusqlite::Error) -> Self {
        MizanError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for MizanError {
    fn from(e: serde_json::Error) -> Self {
        MizanError::Storage(e.to_string())
    }
}

impl serde::Serialize for MizanError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MizanError>;
