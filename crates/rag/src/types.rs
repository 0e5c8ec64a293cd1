//! RAG pipeline type definitions.

use serde::{Deserialize, Serialize};

/// One row of the tabular corpus, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Cooking action summary ("Động từ (Action)")
    pub action: String,

    /// Name of the original recipe ("Công thức gốc (Original recipes)")
    pub original_recipe: String,

    /// Full original passage ("Nguyên văn")
    pub full_text: String,

    /// Free-form publication date ("Ngày xuất bản")
    pub date: String,

    /// Issue number ("Số báo")
    pub issue: String,

    /// Publisher name ("Báo")
    pub newspaper: String,
}

impl SourceRecord {
    /// A record is discarded at load time when both primary fields are empty.
    pub fn is_empty(&self) -> bool {
        self.action.is_empty() && self.original_recipe.is_empty()
    }
}

/// Metadata carried by every document and inherited by its chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Path of the CSV file the record came from
    pub source_path: String,

    /// File name component of `source_path`
    pub file_name: String,

    pub action: String,
    pub original_recipe: String,
    pub full_text: String,
    pub date: String,
    pub issue: String,
    pub newspaper: String,

    /// Human-readable citation label derived at load time
    pub citation_label: String,
}

/// A normalized corpus document: content for embedding plus citation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Fixed-format concatenation of all record fields (never empty)
    pub content: String,

    pub metadata: DocMetadata,
}

/// A bounded slice of a document, the atomic retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: String,

    /// Text content
    pub content: String,

    /// Copy of the parent document's metadata
    pub metadata: DocMetadata,

    /// Embedding vector, filled in at index-build time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Options for the ask operation. Unset fields fall back to configuration
/// defaults.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// The user's emotion / question
    pub question: String,

    /// The weight of the emotion
    pub additional_context: Option<String>,

    /// Final number of chunks kept for context/citation
    pub top_k: Option<usize>,

    /// Number of candidates fetched by similarity search
    pub pool_size: Option<usize>,

    /// Sampling temperature for this call only
    pub temperature: Option<f32>,

    /// Whether to rerank the candidate pool (default true)
    pub rerank: bool,
}

impl AskOptions {
    /// Create options for a question with all defaults.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            additional_context: None,
            top_k: None,
            pool_size: None,
            temperature: None,
            rerank: true,
        }
    }
}

/// Presentation payload for one retrieved chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    /// Citation label, date-localized
    pub label: String,

    pub page_number: Option<u32>,

    /// Issue number of the newspaper
    pub chapter: Option<String>,

    /// Newspaper name
    pub book_title: Option<String>,

    pub file_name: Option<String>,
    pub source_path: Option<String>,

    /// Displayed text, date-localized
    pub text: String,

    pub viewer_url: Option<String>,
}

/// Result of the ask operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Generated answer, trimmed
    pub answer: String,

    /// Unique citation labels in first-seen order
    pub citations: Vec<String>,

    /// One payload per retrieved chunk
    pub sources: Vec<SourceChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_empty() {
        let record = SourceRecord::default();
        assert!(record.is_empty());

        let record = SourceRecord {
            action: "rửa".to_string(),
            ..Default::default()
        };
        assert!(!record.is_empty());

        let record = SourceRecord {
            original_recipe: "Cá kho".to_string(),
            ..Default::default()
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn test_ask_options_defaults() {
        let options = AskOptions::new("nỗi buồn");
        assert_eq!(options.question, "nỗi buồn");
        assert!(options.rerank);
        assert!(options.top_k.is_none());
        assert!(options.pool_size.is_none());
        assert!(options.temperature.is_none());
    }
}
