//! Ingest command handler.
//!
//! Builds or loads the persisted vector index from the corpus.

use clap::Args;
use hearth_core::{config::AppConfig, AppResult};
use hearth_rag::RagService;

/// Build the vector index from the corpus
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Force a full rebuild even if an index already exists
    #[arg(long)]
    pub force: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting ingestion (force={})", self.force);

        let service = RagService::from_config(config.clone())?;
        service.ingest(self.force).await?;

        tracing::info!("Ingestion completed successfully");
        println!("Index ready at {:?}", config.persist_dir);

        Ok(())
    }
}
