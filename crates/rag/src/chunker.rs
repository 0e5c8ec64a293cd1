//! Document chunking with configurable size and overlap.
//!
//! Splitting respects the semantic separator hierarchy of the `text-splitter`
//! crate (paragraph break, line break, word, character), so a chunk never
//! exceeds the configured maximum size and no non-whitespace content is lost.
//! Every chunk inherits the parent document's metadata unmodified.

use crate::types::{Chunk, Document};
use hearth_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Split one document into overlapping chunks.
pub fn split_document(document: &Document, chunk_size: usize, overlap: usize) -> AppResult<Vec<Chunk>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<Chunk> = splitter
        .chunks(&document.content)
        .filter(|text| !text.trim().is_empty())
        .map(|text| Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: text.to_string(),
            metadata: document.metadata.clone(),
            embedding: None,
        })
        .collect();

    tracing::debug!(
        "Split document into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

/// Split every document, preserving document order.
pub fn split_documents(
    documents: &[Document],
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for document in documents {
        chunks.extend(split_document(document, chunk_size, overlap)?);
    }

    tracing::info!(
        "Chunked {} documents into {} chunks",
        documents.len(),
        chunks.len()
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocMetadata;

    fn document(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocMetadata {
                action: "rửa".to_string(),
                newspaper: "Báo X".to_string(),
                citation_label: "Cá kho (Báo X, May 10, 2020)".to_string(),
                ..Default::default()
            },
        }
    }

    /// Strip whitespace for round-trip comparison.
    fn non_whitespace(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let doc = document("Hành động: rửa\nNgày: May 10, 2020");
        let chunks = split_document(&doc, 1600, 300).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, doc.content);
    }

    #[test]
    fn test_chunks_respect_max_size() {
        let paragraphs: Vec<String> = (0..40).map(|i| format!("Đoạn văn số {}.", i)).collect();
        let doc = document(&paragraphs.join("\n\n"));
        let chunks = split_document(&doc, 80, 16).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let chars = chunk.content.chars().count();
            assert!(chars <= 80, "chunk too large: {} chars", chars);
        }
    }

    #[test]
    fn test_chunks_inherit_metadata() {
        let doc = document(&"một hai ba bốn năm ".repeat(30));
        let chunks = split_document(&doc, 100, 20).unwrap();

        for chunk in &chunks {
            assert_eq!(chunk.metadata, doc.metadata);
            assert!(!chunk.id.is_empty());
        }
    }

    #[test]
    fn test_round_trip_without_overlap_keeps_non_whitespace() {
        let doc = document(&"cá kho nước mắm\nrau thơm hành tím\n\n".repeat(20));
        let chunks = split_document(&doc, 120, 0).unwrap();

        let rejoined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(non_whitespace(&rejoined), non_whitespace(&doc.content));
    }

    #[test]
    fn test_chunks_are_exact_slices_of_the_source() {
        let doc = document(&"băm nhỏ trộn đều gói lại ".repeat(40));
        let chunks = split_document(&doc, 100, 25).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(doc.content.contains(&chunk.content));
        }
        // Overlapping split still reaches the end of the document
        assert!(doc.content.trim_end().ends_with(chunks.last().unwrap().content.trim_end()));
    }

    #[test]
    fn test_split_documents_preserves_order() {
        let docs = vec![document("đầu tiên"), document("thứ hai")];
        let chunks = split_documents(&docs, 1600, 300).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "đầu tiên");
        assert_eq!(chunks[1].content, "thứ hai");
    }

    #[test]
    fn test_invalid_overlap_is_config_error() {
        let doc = document("nội dung");
        let result = split_document(&doc, 100, 100);
        assert!(matches!(result, Err(hearth_core::AppError::Config(_))));
    }
}
