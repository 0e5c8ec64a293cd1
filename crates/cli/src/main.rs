//! Hearth CLI
//!
//! Main entry point for the hearth command-line tool. Answers questions over
//! the curated Vietnamese recipe corpus with retrieval-augmented generation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IngestCommand};
use hearth_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Hearth - poetic recipes from a historical Vietnamese cooking corpus
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(about = "Cited poetic recipes via retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory containing the corpus CSV
    #[arg(short, long, global = true, env = "HEARTH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for the persisted vector index
    #[arg(long, global = true, env = "HEARTH_PERSIST_DIR")]
    persist_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Chat provider (ollama, openai)
    #[arg(short, long, global = true, env = "HEARTH_PROVIDER")]
    provider: Option<String>,

    /// Chat model identifier
    #[arg(short, long, global = true, env = "HEARTH_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question and receive a cited poetic recipe
    Ask(AskCommand),

    /// Build or rebuild the vector index
    Ingest(IngestCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.data_dir,
        cli.persist_dir,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Hearth CLI starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Ingest(_) => "ingest",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
