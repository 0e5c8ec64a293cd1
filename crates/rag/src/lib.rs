//! Retrieval-augmented generation pipeline for the Hearth assistant.
//!
//! Answers a question by loading the curated corpus, chunking it, embedding
//! chunks into a persisted vector index, searching that index, optionally
//! reranking the candidates with a cross-encoder, and conditioning a
//! generation model on the retrieved context to produce a cited answer.

pub mod chunker;
pub mod citation;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod rerank;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use service::RagService;
pub use types::{AnswerResult, AskOptions, Chunk, DocMetadata, Document, SourceChunk, SourceRecord};
