//! Cross-encoder reranking of retrieved candidates.
//!
//! The scorer itself is an opaque capability behind [`RerankScorer`]; the
//! logic here owns candidate ordering: score each (query, content) pair,
//! stable-sort descending, keep the top-k.

use crate::types::Chunk;
use async_trait::async_trait;
use hearth_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for cross-encoder relevance scorers.
#[async_trait]
pub trait RerankScorer: Send + Sync {
    /// Get scorer name (e.g., "http", "overlap")
    fn scorer_name(&self) -> &str;

    /// Score each text jointly with the query. Returns one score per text,
    /// higher meaning more relevant.
    async fn score(&self, query: &str, texts: &[String]) -> AppResult<Vec<f32>>;
}

/// Rerank candidates for a query and keep the `top_k` best.
///
/// Empty candidates return immediately without invoking the scorer. Sorting
/// is stable: candidates with equal scores keep their original order.
pub async fn rerank(
    scorer: &dyn RerankScorer,
    query: &str,
    candidates: Vec<Chunk>,
    top_k: usize,
) -> AppResult<Vec<Chunk>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
    let scores = scorer.score(query, &texts).await?;

    if scores.len() != candidates.len() {
        return Err(AppError::Rerank(format!(
            "Scorer returned {} scores for {} candidates",
            scores.len(),
            candidates.len()
        )));
    }

    let mut scored: Vec<(f32, Chunk)> = scores.into_iter().zip(candidates).collect();
    // Stable sort keeps original candidate order for equal scores
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    tracing::debug!(
        "Reranked candidates, kept {} (top score: {:.3})",
        scored.len(),
        scored.first().map(|(s, _)| *s).unwrap_or(0.0)
    );

    Ok(scored.into_iter().map(|(_, chunk)| chunk).collect())
}

/// Create a scorer from configuration.
///
/// `"overlap"` selects the deterministic lexical scorer; anything else is
/// treated as the base URL of a rerank service.
pub fn create_scorer(url: &str, model: &str) -> AppResult<Box<dyn RerankScorer>> {
    match url {
        "overlap" => Ok(Box::new(OverlapScorer)),
        _ => Ok(Box::new(HttpReranker::new(url, model)?)),
    }
}

/// Request payload for a text-embeddings-inference style `/rerank` endpoint.
#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    score: f32,
}

/// HTTP cross-encoder client against a `/rerank` endpoint.
pub struct HttpReranker {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpReranker {
    /// Create a client for the rerank service at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Rerank(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            client,
        })
    }
}

#[async_trait]
impl RerankScorer for HttpReranker {
    fn scorer_name(&self) -> &str {
        "http"
    }

    async fn score(&self, query: &str, texts: &[String]) -> AppResult<Vec<f32>> {
        let url = format!("{}/rerank", self.base_url);
        let request = RerankRequest {
            model: &self.model,
            query,
            texts,
            raw_scores: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Rerank(format!("Failed to send rerank request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Rerank(format!(
                "Rerank API error ({}): {}",
                status, error_text
            )));
        }

        let results: Vec<RerankResult> = response
            .json()
            .await
            .map_err(|e| AppError::Rerank(format!("Failed to parse rerank response: {}", e)))?;

        // The service returns results sorted by score; restore input order
        let mut scores = vec![0.0; texts.len()];
        for result in results {
            if result.index >= scores.len() {
                return Err(AppError::Rerank(format!(
                    "Rerank response index {} out of range",
                    result.index
                )));
            }
            scores[result.index] = result.score;
        }

        Ok(scores)
    }
}

/// Deterministic lexical scorer: the fraction of query words present in the
/// candidate. Used for development and tests in place of a live cross-encoder.
#[derive(Debug, Default)]
pub struct OverlapScorer;

#[async_trait]
impl RerankScorer for OverlapScorer {
    fn scorer_name(&self) -> &str {
        "overlap"
    }

    async fn score(&self, query: &str, texts: &[String]) -> AppResult<Vec<f32>> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();

        let scores = texts
            .iter()
            .map(|text| {
                if query_words.is_empty() {
                    return 0.0;
                }
                let text_lower = text.to_lowercase();
                let hits = query_words
                    .iter()
                    .filter(|w| text_lower.contains(w.as_str()))
                    .count();
                hits as f32 / query_words.len() as f32
            })
            .collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunk(content: &str) -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            metadata: DocMetadata::default(),
            embedding: None,
        }
    }

    /// Scorer returning a fixed score sequence and counting invocations.
    struct ScriptedScorer {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl ScriptedScorer {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RerankScorer for ScriptedScorer {
        fn scorer_name(&self) -> &str {
            "scripted"
        }

        async fn score(&self, _query: &str, texts: &[String]) -> AppResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores[..texts.len()].to_vec())
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_the_scorer() {
        let scorer = ScriptedScorer::new(vec![]);
        let result = rerank(&scorer, "query", Vec::new(), 3).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerank_orders_by_score_descending() {
        let scorer = ScriptedScorer::new(vec![0.1, 0.9, 0.5]);
        let candidates = vec![chunk("low"), chunk("high"), chunk("mid")];

        let result = rerank(&scorer, "query", candidates, 3).await.unwrap();

        let contents: Vec<&str> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_rerank_keeps_top_k_of_distinct_scores() {
        // Ten distinct-scoring candidates, pool_size=10 / top_k=3
        let scores: Vec<f32> = (0..10).map(|i| i as f32 / 10.0).collect();
        let scorer = ScriptedScorer::new(scores);
        let candidates: Vec<Chunk> = (0..10).map(|i| chunk(&format!("c{}", i))).collect();

        let result = rerank(&scorer, "query", candidates, 3).await.unwrap();

        assert_eq!(result.len(), 3);
        let contents: Vec<&str> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["c9", "c8", "c7"]);
    }

    #[tokio::test]
    async fn test_rerank_ties_keep_original_order() {
        let scorer = ScriptedScorer::new(vec![0.5, 0.5, 0.9, 0.5]);
        let candidates = vec![chunk("a"), chunk("b"), chunk("top"), chunk("c")];

        let result = rerank(&scorer, "query", candidates, 4).await.unwrap();

        let contents: Vec<&str> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["top", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_rerank_rejects_mismatched_score_count() {
        struct ShortScorer;

        #[async_trait]
        impl RerankScorer for ShortScorer {
            fn scorer_name(&self) -> &str {
                "short"
            }

            async fn score(&self, _query: &str, _texts: &[String]) -> AppResult<Vec<f32>> {
                Ok(vec![0.5])
            }
        }

        let candidates = vec![chunk("a"), chunk("b")];
        let result = rerank(&ShortScorer, "query", candidates, 2).await;
        assert!(matches!(result, Err(AppError::Rerank(_))));
    }

    #[tokio::test]
    async fn test_overlap_scorer_prefers_shared_words() {
        let scorer = OverlapScorer;
        let texts = vec![
            "rửa cá kho với nước mắm".to_string(),
            "trồng rau ngoài vườn".to_string(),
        ];

        let scores = scorer.score("rửa cá", &texts).await.unwrap();
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_overlap_scorer_deterministic() {
        let scorer = OverlapScorer;
        let texts = vec!["rửa cá".to_string()];

        let first = scorer.score("cá", &texts).await.unwrap();
        let second = scorer.score("cá", &texts).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_create_scorer() {
        let overlap = create_scorer("overlap", "any").unwrap();
        assert_eq!(overlap.scorer_name(), "overlap");

        let http = create_scorer("http://localhost:8090", "BAAI/bge-reranker-base").unwrap();
        assert_eq!(http.scorer_name(), "http");
    }
}
