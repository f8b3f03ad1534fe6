//! Language-model interface.
//!
//! [`ModelClient`] is the single seam between the orchestration layer and
//! the LLM provider: prompt in, text out, typed [`ModelError`] on failure.
//! [`GenaiModel`] is the production implementation backed by the genai
//! client (Gemini, OpenAI, Ollama, etc. selected by model name); tests
//! substitute stubs.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};

use crate::error::ModelError;

/// Opaque completion interface: system prompt + user prompt in, text out.
///
/// Implementations must be safe to call concurrently; workers share one
/// client across parallel subtasks.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ModelError>;
}

/// Production [`ModelClient`] backed by the genai multi-provider client.
///
/// Provider API keys are resolved by genai from its conventional
/// environment variables (e.g. `GEMINI_API_KEY`, `OPENAI_API_KEY`).
pub struct GenaiModel {
    client: Client,
    model: String,
}

impl GenaiModel {
    pub fn new(model: String) -> Self {
        Self {
            client: Client::default(),
            model,
        }
    }
}

#[async_trait]
impl ModelClient for GenaiModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ModelError> {
        let chat_req = ChatRequest::from_system(system).append_message(ChatMessage::user(prompt));

        // Low temperature: research planning and synthesis want stable,
        // grounded output rather than creative variation.
        let options = ChatOptions::default().with_temperature(0.2);

        let response = self
            .client
            .exec_chat(&self.model, chat_req, Some(&options))
            .await
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or(ModelError::EmptyResponse)
    }
}

/// Extract the JSON payload from a model response.
///
/// Models frequently wrap structured output in Markdown code fences even
/// when told not to. Strips a leading ```json (or bare ```) fence and the
/// trailing fence, then trims. Returns the input unchanged when no fence
/// is present; actual validation happens at serde deserialization.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag on the fence line, if any.
    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };

    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_passes_bare_json_through() {
        let raw = r#"{"subtasks": []}"#;
        assert_eq!(extract_json(raw), raw);
    }

    #[test]
    fn extract_json_strips_fence_with_language_tag() {
        let raw = "```json\n{\"summary\": \"x\"}\n```";
        assert_eq!(extract_json(raw), "{\"summary\": \"x\"}");
    }

    #[test]
    fn extract_json_strips_bare_fence() {
        let raw = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_json(raw), "[1, 2, 3]");
    }

    #[test]
    fn extract_json_trims_surrounding_whitespace() {
        let raw = "  \n {\"a\": 1} \n ";
        assert_eq!(extract_json(raw), "{\"a\": 1}");
    }
}
