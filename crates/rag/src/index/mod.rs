//! Vector index abstraction for corpus chunks.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval, plus
//! the persisted-index signal used by build-or-load.

pub mod lance;

pub use lance::LanceIndex;

use crate::types::Chunk;
use async_trait::async_trait;
use hearth_core::AppResult;
use std::path::Path;

/// Trait for vector index backends.
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    /// Insert chunks (with embeddings) into the index.
    async fn add_chunks(&self, chunks: &[Chunk]) -> AppResult<()>;

    /// Search for the most similar chunks to the query embedding.
    ///
    /// Returns up to `limit` chunks ordered by descending similarity score.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> AppResult<Vec<(Chunk, f32)>>;

    /// Number of chunks stored in the index.
    async fn count(&self) -> AppResult<usize>;
}

/// Whether a persisted index can be reused without rebuilding.
///
/// The on-disk layout is provider-defined and opaque; the only signal the
/// pipeline relies on is "the directory exists and is non-empty".
pub fn has_persisted_index(persist_dir: &Path) -> bool {
    persist_dir.is_dir()
        && std::fs::read_dir(persist_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
}
