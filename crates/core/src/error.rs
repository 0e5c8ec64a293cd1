//! Error types for the Hearth RAG assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, corpus loading, the external
//! embedding/rerank/generation providers, and index persistence.

use thiserror::Error;

/// Unified error type for the Hearth RAG assistant.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable corpus data (missing CSV or zero valid rows)
    #[error("No data found: {0}")]
    NoDataFound(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Cross-encoder rerank errors
    #[error("Rerank error: {0}")]
    Rerank(String),

    /// Chat-completion provider errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Vector index storage errors
    #[error("Index persistence error: {0}")]
    IndexPersistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
