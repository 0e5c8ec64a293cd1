//! Prompt system type definitions.

use serde::{Deserialize, Serialize};

/// A fully rendered prompt, ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System instruction (transmitted verbatim to the provider)
    pub system: String,

    /// Rendered user message
    pub user: String,
}

/// Inputs for the user turn of the poetic-recipe prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptInputs {
    /// Retrieved context block
    pub context: String,

    /// The user's emotion ("question" in the query operation)
    pub question: String,

    /// The weight of the emotion; callers substitute a placeholder when absent
    pub additional_context: String,
}
