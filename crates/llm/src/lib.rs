//! LLM integration crate for the Hearth RAG assistant.
//!
//! This crate provides a provider-agnostic abstraction for chat-completion
//! providers through a unified trait-based interface. Requests carry all
//! sampling parameters, so a per-call temperature override is naturally
//! request-scoped.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: OpenAI or any API-compatible endpoint
//!
//! # Example
//! ```no_run
//! use hearth_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
