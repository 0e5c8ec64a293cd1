//! LanceDB-backed vector index implementation.

use crate::index::ChunkIndex;
use crate::types::{Chunk, DocMetadata};
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use hearth_core::{AppError, AppResult};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::path::Path;
use std::sync::Arc;

const TABLE_NAME: &str = "chunks";

/// LanceDB-backed vector index for corpus chunks.
pub struct LanceIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceIndex {
    /// Create or open a LanceDB index at the specified directory.
    pub async fn open(db_path: &Path, embedding_dim: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::IndexPersistence(format!("Failed to create index directory: {}", e))
            })?;
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.contains(&TABLE_NAME.to_string()) {
            conn.open_table(TABLE_NAME)
                .execute()
                .await
                .map_err(|e| AppError::IndexPersistence(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                TABLE_NAME,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized LanceDB index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Arrow schema: one column per metadata field plus content and embedding.
    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            Field::new("source_path", DataType::Utf8, true),
            Field::new("file_name", DataType::Utf8, true),
            Field::new("action", DataType::Utf8, true),
            Field::new("original_recipe", DataType::Utf8, true),
            Field::new("full_text", DataType::Utf8, true),
            Field::new("date", DataType::Utf8, true),
            Field::new("issue", DataType::Utf8, true),
            Field::new("newspaper", DataType::Utf8, true),
            Field::new("citation_label", DataType::Utf8, true),
        ]))
    }

    /// Convert chunks to a single Arrow RecordBatch.
    fn chunks_to_batch(&self, chunks: &[Chunk]) -> AppResult<RecordBatch> {
        let schema = Self::create_schema(self.embedding_dim);

        let mut flat_embeddings = Vec::with_capacity(chunks.len() * self.embedding_dim);
        for chunk in chunks {
            let embedding = chunk.embedding.as_ref().ok_or_else(|| {
                AppError::IndexPersistence("Chunk missing embedding".to_string())
            })?;

            if embedding.len() != self.embedding_dim {
                return Err(AppError::IndexPersistence(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.embedding_dim,
                    embedding.len()
                )));
            }

            flat_embeddings.extend_from_slice(embedding);
        }

        let embedding_values = Float32Array::from(flat_embeddings);
        let embedding_array = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(embedding_values),
            None,
        );

        macro_rules! string_column {
            ($($field:ident).+) => {
                Arc::new(
                    chunks
                        .iter()
                        .map(|c| Some(c.$($field).+.as_str()))
                        .collect::<StringArray>(),
                )
            };
        }

        RecordBatch::try_new(
            schema,
            vec![
                string_column!(id),
                string_column!(content),
                Arc::new(embedding_array),
                string_column!(metadata.source_path),
                string_column!(metadata.file_name),
                string_column!(metadata.action),
                string_column!(metadata.original_recipe),
                string_column!(metadata.full_text),
                string_column!(metadata.date),
                string_column!(metadata.issue),
                string_column!(metadata.newspaper),
                string_column!(metadata.citation_label),
            ],
        )
        .map_err(|e| AppError::IndexPersistence(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert one Arrow RecordBatch row back into a chunk.
    fn batch_to_chunk(&self, batch: &RecordBatch, row_idx: usize) -> AppResult<Chunk> {
        let string_at = |col: usize, name: &str| -> AppResult<String> {
            Ok(batch
                .column(col)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| AppError::IndexPersistence(format!("Invalid {} column", name)))?
                .value(row_idx)
                .to_string())
        };

        let embedding_list = batch
            .column(2)
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| AppError::IndexPersistence("Invalid embedding column".to_string()))?;

        let embedding_array_ref = embedding_list.value(row_idx);
        let embedding_values = embedding_array_ref
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| AppError::IndexPersistence("Invalid embedding values".to_string()))?;

        let embedding: Vec<f32> = (0..embedding_values.len())
            .map(|i| embedding_values.value(i))
            .collect();

        Ok(Chunk {
            id: string_at(0, "id")?,
            content: string_at(1, "content")?,
            embedding: Some(embedding),
            metadata: DocMetadata {
                source_path: string_at(3, "source_path")?,
                file_name: string_at(4, "file_name")?,
                action: string_at(5, "action")?,
                original_recipe: string_at(6, "original_recipe")?,
                full_text: string_at(7, "full_text")?,
                date: string_at(8, "date")?,
                issue: string_at(9, "issue")?,
                newspaper: string_at(10, "newspaper")?,
                citation_label: string_at(11, "citation_label")?,
            },
        })
    }
}

#[async_trait]
impl ChunkIndex for LanceIndex {
    async fn add_chunks(&self, chunks: &[Chunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let batch = self.chunks_to_batch(chunks)?;

        self.table
            .add(RecordBatchIterator::new(
                vec![Ok(batch.clone())],
                batch.schema(),
            ))
            .execute()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to add chunks: {}", e)))?;

        tracing::debug!("Inserted {} chunks into LanceDB", chunks.len());
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> AppResult<Vec<(Chunk, f32)>> {
        if query_embedding.len() != self.embedding_dim {
            return Err(AppError::IndexPersistence(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                query_embedding.len()
            )));
        }

        let batches = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::IndexPersistence(format!("Failed to create query: {}", e)))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to collect results: {}", e)))?;

        let mut chunks_with_scores = Vec::new();

        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let chunk = match self.batch_to_chunk(batch, row_idx) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("Failed to convert batch row {} to chunk: {}", row_idx, e);
                        continue;
                    }
                };

                let score = chunk
                    .embedding
                    .as_ref()
                    .map(|embedding| cosine_similarity(query_embedding, embedding))
                    .unwrap_or(0.0);

                chunks_with_scores.push((chunk, score));
            }
        }

        // Sort by score descending; the ANN pass already bounds the pool
        chunks_with_scores
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        chunks_with_scores.truncate(limit);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{})",
            chunks_with_scores.len(),
            limit
        );

        Ok(chunks_with_scores)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::IndexPersistence(format!("Failed to count rows: {}", e)))
    }
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            metadata: DocMetadata {
                citation_label: format!("{} (Báo X, May 10, 2020)", content),
                newspaper: "Báo X".to_string(),
                ..Default::default()
            },
            embedding: Some(embedding),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![1.0, 0.0, 0.0];
        let d = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&c, &d).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_add_search_and_count() {
        let temp = TempDir::new().unwrap();
        let index = LanceIndex::open(&temp.path().join("index"), 3).await.unwrap();

        index
            .add_chunks(&[
                chunk("cá kho", vec![1.0, 0.0, 0.0]),
                chunk("rau luộc", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 2);

        let results = index.search(&[0.9, 0.1, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.content, "cá kho");
        assert!(results[0].1 > results[1].1);
        assert_eq!(results[0].0.metadata.newspaper, "Báo X");
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let temp = TempDir::new().unwrap();
        let index = LanceIndex::open(&temp.path().join("index"), 3).await.unwrap();

        let chunks: Vec<Chunk> = (0..5)
            .map(|i| chunk(&format!("c{}", i), vec![1.0, i as f32 / 10.0, 0.0]))
            .collect();
        index.add_chunks(&chunks).await.unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_reopen_preserves_rows() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index");

        {
            let index = LanceIndex::open(&db_path, 3).await.unwrap();
            index
                .add_chunks(&[chunk("cá kho", vec![1.0, 0.0, 0.0])])
                .await
                .unwrap();
        }

        let reopened = LanceIndex::open(&db_path, 3).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let temp = TempDir::new().unwrap();
        let index = LanceIndex::open(&temp.path().join("index"), 3).await.unwrap();

        let result = index.add_chunks(&[chunk("cá kho", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(AppError::IndexPersistence(_))));

        let result = index.search(&[1.0, 0.0], 1).await;
        assert!(matches!(result, Err(AppError::IndexPersistence(_))));
    }
}
