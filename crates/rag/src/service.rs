//! RAG pipeline orchestration and answer assembly.
//!
//! [`RagService`] owns the shared, lazily-built index handle and wires the
//! corpus loader, chunker, embedding provider, vector index, reranker, and
//! generation provider into the single `ask` operation. It is stateless
//! across calls apart from the index handle and the corpus cache for the
//! random-context mode.

use crate::chunker;
use crate::citation::{display_label, localize_date};
use crate::corpus;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::index::{has_persisted_index, ChunkIndex, LanceIndex};
use crate::rerank::{create_scorer, rerank, RerankScorer};
use crate::types::{AnswerResult, AskOptions, Chunk, Document, SourceChunk};
use hearth_core::{AppConfig, AppError, AppResult, RetrievalMode};
use hearth_llm::{LlmClient, LlmRequest};
use hearth_prompt::build_prompt;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Substituted for the context block when no chunks were retrieved.
const NO_CONTEXT_PLACEHOLDER: &str = "No supporting context retrieved.";

/// Fixed answer of the random-context mode when the corpus is missing.
const APOLOGY_ANSWER: &str =
    "Xin lỗi, hiện tại tôi không có dữ liệu công thức để chế biến cảm xúc này.";

/// The RAG pipeline service.
pub struct RagService {
    config: AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    scorer: Box<dyn RerankScorer>,
    llm: Arc<dyn LlmClient>,

    /// Shared index handle. The mutex serializes first-build races: a single
    /// build wins and later callers observe the completed handle. Searches
    /// run on a cloned `Arc`, outside the lock.
    index: Mutex<Option<Arc<dyn ChunkIndex>>>,

    /// Corpus cache for the random-context mode; populated at most once per
    /// process and read-only thereafter.
    corpus_cache: OnceCell<Arc<Vec<Document>>>,
}

impl RagService {
    /// Create a service with explicit providers.
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        scorer: Box<dyn RerankScorer>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            config,
            embedder,
            scorer,
            llm,
            index: Mutex::new(None),
            corpus_cache: OnceCell::new(),
        }
    }

    /// Create a service with providers resolved from configuration.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let embedding_config = EmbeddingConfig {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
            endpoint: None,
        };
        let embedder = create_provider(&embedding_config)?;

        let scorer = create_scorer(&config.rerank_url, &config.rerank_model)?;

        let llm = hearth_llm::create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )
        .map_err(AppError::Config)?;

        Ok(Self::new(config, embedder, scorer, llm))
    }

    /// Pre-seed the index handle (alternate backends, tests).
    pub fn with_index(self, index: Arc<dyn ChunkIndex>) -> Self {
        Self {
            index: Mutex::new(Some(index)),
            ..self
        }
    }

    /// Build-or-load the vector index. Idempotent once built; `force_rebuild`
    /// discards the persisted index after a fully successful embedding pass.
    pub async fn ingest(&self, force_rebuild: bool) -> AppResult<()> {
        self.ensure_index(force_rebuild).await.map(|_| ())
    }

    /// Answer a question.
    pub async fn ask(&self, options: AskOptions) -> AppResult<AnswerResult> {
        match self.config.retrieval_mode {
            RetrievalMode::Semantic => self.ask_semantic(options).await,
            RetrievalMode::Random => self.ask_random(options).await,
        }
    }

    async fn ask_semantic(&self, options: AskOptions) -> AppResult<AnswerResult> {
        let index = self.ensure_index(false).await?;

        let pool_size = options.pool_size.unwrap_or(self.config.pool_size);
        let top_k = options.top_k.unwrap_or(self.config.top_k);

        let query_embedding = self.embedder.embed(&options.question).await?;
        let candidates: Vec<Chunk> = index
            .search(&query_embedding, pool_size)
            .await?
            .into_iter()
            .map(|(chunk, _score)| chunk)
            .collect();

        tracing::info!(
            "Retrieved {} candidates for question (pool_size: {})",
            candidates.len(),
            pool_size
        );

        let chunks = if options.rerank {
            rerank(self.scorer.as_ref(), &options.question, candidates, top_k).await?
        } else {
            // Reranking disabled: truncate the raw similarity order
            let mut chunks = candidates;
            chunks.truncate(top_k);
            chunks
        };

        self.assemble(&options, &chunks).await
    }

    async fn ask_random(&self, options: AskOptions) -> AppResult<AnswerResult> {
        let documents = match self.corpus().await {
            Ok(documents) => documents,
            Err(AppError::NoDataFound(msg)) => {
                tracing::warn!("Random-context mode has no corpus: {}", msg);
                return Ok(AnswerResult {
                    answer: APOLOGY_ANSWER.to_string(),
                    citations: Vec::new(),
                    sources: Vec::new(),
                });
            }
            Err(e) => return Err(e),
        };

        let selected = &documents[fastrand::usize(..documents.len())];
        tracing::debug!("Picked random context: {}", selected.metadata.citation_label);

        let chunk = Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: selected.content.clone(),
            metadata: selected.metadata.clone(),
            embedding: None,
        };

        self.assemble(&options, std::slice::from_ref(&chunk)).await
    }

    /// Format context, invoke the generation provider once, and extract
    /// citations and source payloads.
    async fn assemble(&self, options: &AskOptions, chunks: &[Chunk]) -> AppResult<AnswerResult> {
        let context = format_context(chunks);

        let prompt = build_prompt(
            self.config.prompt_variant,
            &context,
            &options.question,
            options.additional_context.as_deref(),
        )?;

        // Temperature travels on the request, so an override is scoped to
        // this call by construction
        let request = LlmRequest::new(prompt.user, &self.config.model)
            .with_system(prompt.system)
            .with_temperature(options.temperature.unwrap_or(self.config.temperature));

        let response = self.llm.complete(&request).await?;
        let answer = response.content.trim().to_string();

        let citations = unique_citations(chunks);
        let sources = chunks.iter().map(build_source_payload).collect();

        Ok(AnswerResult {
            answer,
            citations,
            sources,
        })
    }

    /// Get the shared index handle, building or loading it on first use.
    async fn ensure_index(&self, force_rebuild: bool) -> AppResult<Arc<dyn ChunkIndex>> {
        let mut guard = self.index.lock().await;

        if !force_rebuild {
            if let Some(index) = guard.as_ref() {
                return Ok(Arc::clone(index));
            }
        }

        let index: Arc<dyn ChunkIndex> =
            if !force_rebuild && has_persisted_index(&self.config.persist_dir) {
                tracing::info!(
                    "Loading existing index from {:?}",
                    self.config.persist_dir
                );
                Arc::new(LanceIndex::open(&self.config.persist_dir, self.embedder.dimensions()).await?)
            } else {
                self.build_index().await?
            };

        *guard = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Load the corpus, chunk, embed, and persist a fresh index.
    ///
    /// The persisted directory is only touched after every chunk has been
    /// embedded successfully, so a failed rebuild leaves a previously
    /// persisted index intact.
    async fn build_index(&self) -> AppResult<Arc<dyn ChunkIndex>> {
        tracing::info!("Building new index at {:?}", self.config.persist_dir);

        let documents = corpus::load_documents(&self.config.data_dir)?;
        let mut chunks = chunker::split_documents(
            &documents,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = Some(embedding);
        }

        if has_persisted_index(&self.config.persist_dir) {
            std::fs::remove_dir_all(&self.config.persist_dir).map_err(|e| {
                AppError::IndexPersistence(format!("Failed to clear stale index: {}", e))
            })?;
        }

        let index = LanceIndex::open(&self.config.persist_dir, self.embedder.dimensions()).await?;
        index.add_chunks(&chunks).await?;

        tracing::info!(
            "Indexed {} chunks from {} source passages",
            chunks.len(),
            documents.len()
        );

        Ok(Arc::new(index))
    }

    /// Load the corpus data cache (random-context mode).
    async fn corpus(&self) -> AppResult<Arc<Vec<Document>>> {
        let documents = self
            .corpus_cache
            .get_or_try_init(|| async {
                corpus::load_documents(&self.config.data_dir).map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(documents))
    }
}

/// Join chunk contents into the context block for the prompt.
fn format_context(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return NO_CONTEXT_PLACEHOLDER.to_string();
    }

    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Deduplicated, first-seen-order citation labels (date-localized).
fn unique_citations(chunks: &[Chunk]) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    for chunk in chunks {
        let label = localize_date(&display_label(&chunk.metadata), &chunk.metadata.date);
        if !citations.contains(&label) {
            citations.push(label);
        }
    }
    citations
}

/// Build the presentation payload for one retrieved chunk.
fn build_source_payload(chunk: &Chunk) -> SourceChunk {
    let metadata = &chunk.metadata;

    let label = localize_date(&display_label(metadata), &metadata.date);

    // Prefer the original passage for display, falling back to the chunk text
    let text = if metadata.full_text.is_empty() {
        chunk.content.clone()
    } else {
        metadata.full_text.clone()
    };
    let text = localize_date(&text, &metadata.date);

    let none_if_empty = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };

    SourceChunk {
        label,
        page_number: None,
        chapter: none_if_empty(&metadata.issue),
        book_title: none_if_empty(&metadata.newspaper),
        file_name: none_if_empty(&metadata.file_name),
        source_path: none_if_empty(&metadata.source_path),
        text,
        viewer_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocMetadata;

    fn chunk_with_label(label: &str, date: &str) -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: "Hành động: rửa".to_string(),
            metadata: DocMetadata {
                citation_label: label.to_string(),
                date: date.to_string(),
                issue: "12".to_string(),
                newspaper: "Báo X".to_string(),
                full_text: format!("đăng ngày {}", date),
                ..Default::default()
            },
            embedding: None,
        }
    }

    #[test]
    fn test_format_context_joins_chunks() {
        let chunks = vec![chunk_with_label("a", ""), chunk_with_label("b", "")];
        let context = format_context(&chunks);
        assert_eq!(context, "Hành động: rửa\n\nHành động: rửa");
    }

    #[test]
    fn test_format_context_placeholder_when_empty() {
        assert_eq!(format_context(&[]), NO_CONTEXT_PLACEHOLDER);
    }

    #[test]
    fn test_unique_citations_first_seen_order() {
        let chunks = vec![
            chunk_with_label("Cá kho (Báo X, May 10, 2020)", "May 10, 2020"),
            chunk_with_label("Gỏi cuốn (Báo Y, May 11, 2020)", "May 11, 2020"),
            chunk_with_label("Cá kho (Báo X, May 10, 2020)", "May 10, 2020"),
        ];

        let citations = unique_citations(&chunks);
        assert_eq!(
            citations,
            vec![
                "Cá kho (Báo X, 10 tháng 5, 2020)",
                "Gỏi cuốn (Báo Y, 11 tháng 5, 2020)",
            ]
        );
    }

    #[test]
    fn test_source_payload_localizes_label_and_text() {
        let chunk = chunk_with_label("Cá kho (Báo X, May 10, 2020)", "May 10, 2020");
        let payload = build_source_payload(&chunk);

        assert_eq!(payload.label, "Cá kho (Báo X, 10 tháng 5, 2020)");
        assert_eq!(payload.text, "đăng ngày 10 tháng 5, 2020");
        assert_eq!(payload.chapter.as_deref(), Some("12"));
        assert_eq!(payload.book_title.as_deref(), Some("Báo X"));
        assert!(payload.page_number.is_none());
        assert!(payload.viewer_url.is_none());
    }

    #[test]
    fn test_source_payload_falls_back_to_chunk_content() {
        let mut chunk = chunk_with_label("Cá kho (Báo X, May 10, 2020)", "May 10, 2020");
        chunk.metadata.full_text = String::new();

        let payload = build_source_payload(&chunk);
        assert_eq!(payload.text, "Hành động: rửa");
    }
}
