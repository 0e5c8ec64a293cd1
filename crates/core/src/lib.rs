//! Hearth Core Library
//!
//! This crate provides the foundational utilities for the Hearth RAG
//! assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, PromptVariant, RetrievalMode};
pub use error::{AppError, AppResult};
