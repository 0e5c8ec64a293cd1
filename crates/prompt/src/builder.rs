//! Prompt builder for rendering the user turn and pairing it with the
//! configured system instruction.

use crate::types::{BuiltPrompt, PromptInputs};
use crate::variants::system_instruction;
use hearth_core::{AppError, AppResult, PromptVariant};
use handlebars::Handlebars;

/// Template for the user turn of the generation request.
const USER_TEMPLATE: &str =
    "Context:\n{{context}}\n\nInput Emotion: {{question}}\nWeight: {{additional_context}}";

/// Placeholder used when the caller provides no weight.
pub const DEFAULT_WEIGHT: &str = "không xác định";

/// Build a prompt for the generation provider.
///
/// The system instruction is selected by `variant` and passed through
/// verbatim; the user turn is rendered from the retrieved context, the
/// question, and the optional weight.
pub fn build_prompt(
    variant: PromptVariant,
    context: &str,
    question: &str,
    additional_context: Option<&str>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt (variant: {:?})", variant);

    let inputs = PromptInputs {
        context: context.to_string(),
        question: question.to_string(),
        additional_context: additional_context.unwrap_or(DEFAULT_WEIGHT).to_string(),
    };

    let user = render_template(USER_TEMPLATE, &inputs)?;

    Ok(BuiltPrompt {
        system: system_instruction(variant).to_string(),
        user,
    })
}

/// Render a Handlebars template with the prompt inputs.
fn render_template(template: &str, inputs: &PromptInputs) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Config(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", inputs)
        .map_err(|e| AppError::Config(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_renders_user_turn() {
        let built = build_prompt(
            PromptVariant::Standard,
            "Hành động: rửa",
            "nỗi buồn",
            Some("nặng"),
        )
        .unwrap();

        assert_eq!(
            built.user,
            "Context:\nHành động: rửa\n\nInput Emotion: nỗi buồn\nWeight: nặng"
        );
        assert!(built.system.contains("Đầu bếp Thơ ca"));
    }

    #[test]
    fn test_build_prompt_default_weight() {
        let built = build_prompt(PromptVariant::Standard, "ctx", "buồn", None).unwrap();
        assert!(built.user.ends_with(&format!("Weight: {}", DEFAULT_WEIGHT)));
    }

    #[test]
    fn test_no_html_escaping() {
        let built = build_prompt(PromptVariant::Standard, "a < b & c", "q", None).unwrap();
        assert!(built.user.contains("a < b & c"));
    }

    #[test]
    fn test_variant_selects_system_text() {
        let standard = build_prompt(PromptVariant::Standard, "c", "q", None).unwrap();
        let strict = build_prompt(PromptVariant::StrictIngredients, "c", "q", None).unwrap();

        assert_ne!(standard.system, strict.system);
        assert_eq!(standard.user, strict.user);
    }
}
