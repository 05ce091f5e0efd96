use thiserror::Error;

pub type Result<T> = std::result::Result<T, FolioError>;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl FolioError {
    /// Field-level validation error, surfaced to the end user as-is.
    #[inline]
    pub fn validation(field: &str, message: &str) -> Self {
        FolioError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod content;
pub mod database;
pub mod embeddings;
pub mod knowledge;
