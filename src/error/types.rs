// src/error/types.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset already exists: {0}")]
    AlreadyExists(String),

    #[error("Corrupt media {path:?}: {reason}")]
    CorruptMedia { path: PathBuf, reason: String },

    /// The backing store could not be written. The in-memory catalog was
    /// left at its previous state.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<rayon::ThreadPoolBuildError> for AppError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        AppError::Other(format!("Worker pool error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
