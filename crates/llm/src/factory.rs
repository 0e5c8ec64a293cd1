//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration. It handles provider resolution and secret
//! injection.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
///
/// # Returns
/// A reference-counted trait object implementing `LlmClient`
///
/// # Errors
/// Returns error if the provider is unknown or required secrets are missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url);
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = api_key.ok_or_else(|| "OpenAI provider requires API key".to_string())?;
            let mut client = OpenAiClient::new(api_key);
            if let Some(endpoint) = endpoint {
                client = client.with_base_url(endpoint);
            }
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
