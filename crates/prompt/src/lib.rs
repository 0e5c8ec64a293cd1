//! Prompt system for the Hearth RAG assistant.
//!
//! Provides the closed set of fixed system-instruction variants and the
//! Handlebars-rendered user turn that carries retrieved context, the user's
//! question, and the optional weight.

pub mod builder;
pub mod types;
pub mod variants;

// Re-export main types and functions
pub use builder::{build_prompt, DEFAULT_WEIGHT};
pub use types::{BuiltPrompt, PromptInputs};
pub use variants::system_instruction;
