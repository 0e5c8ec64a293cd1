//! Ask command handler.
//!
//! Answers a question (an emotion and its weight) through the RAG pipeline
//! and prints the answer, citations, and sources.

use clap::Args;
use hearth_core::{config::AppConfig, AppResult};
use hearth_rag::{AskOptions, RagService};

/// Ask a question and receive a cited poetic recipe
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The emotion to transform
    pub question: String,

    /// The weight of the emotion
    #[arg(short = 'w', long)]
    pub weight: Option<String>,

    /// Number of chunks kept for context/citation
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Number of candidates fetched before reranking
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Skip cross-encoder reranking and keep the raw similarity order
    #[arg(long)]
    pub no_rerank: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let service = RagService::from_config(config.clone())?;

        let options = AskOptions {
            question: self.question.clone(),
            additional_context: self.weight.clone(),
            top_k: self.top_k,
            pool_size: self.pool_size,
            temperature: self.temperature,
            rerank: !self.no_rerank,
        };

        let result = service.ask(options).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| hearth_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", result.answer);

            if !result.citations.is_empty() {
                println!();
                println!("Nguồn:");
                for citation in &result.citations {
                    println!("  - {}", citation);
                }
            }

            for source in &result.sources {
                tracing::debug!("Source [{}]: {}", source.label, source.text);
            }
        }

        Ok(())
    }
}
