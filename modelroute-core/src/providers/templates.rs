//! Provider-native request bodies
//!
//! Each [`RequestShape`] knows where its dialect puts the user message, the
//! model, the output token budget and the temperature.

use super::catalog::RequestShape;
use crate::protocol::GenerationParams;
use serde_json::{json, Value};

/// `anthropic_version` Bedrock requires for Anthropic models
const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Render the outbound body for `shape`
pub fn render(shape: RequestShape, message: &str, model: &str, params: GenerationParams) -> Value {
    let GenerationParams {
        max_tokens,
        temperature,
    } = params;

    match shape {
        RequestShape::ChatCompletions => json!({
            "model": model,
            "messages": [{ "role": "user", "content": message }],
            "max_tokens": max_tokens,
            "temperature": temperature,
        }),
        RequestShape::AzureChatCompletions => json!({
            "messages": [{ "role": "user", "content": message }],
            "max_tokens": max_tokens,
            "temperature": temperature,
        }),
        RequestShape::AnthropicMessages => json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": [{ "role": "user", "content": message }],
        }),
        RequestShape::GeminiGenerateContent => json!({
            "contents": [{ "role": "user", "parts": [{ "text": message }] }],
            "generationConfig": {
                "maxOutputTokens": max_tokens,
                "temperature": temperature,
            },
        }),
        RequestShape::BedrockAnthropic => json!({
            "anthropic_version": BEDROCK_ANTHROPIC_VERSION,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": [{ "role": "user", "content": message }],
        }),
        RequestShape::CohereChat => json!({
            "model": model,
            "message": message,
            "max_tokens": max_tokens,
            "temperature": temperature,
        }),
        RequestShape::HuggingFaceInference => json!({
            "inputs": message,
            "parameters": {
                "max_new_tokens": max_tokens,
                "temperature": temperature,
            },
        }),
        RequestShape::PalmGenerateText => json!({
            "prompt": { "text": message },
            "maxOutputTokens": max_tokens,
            "temperature": temperature,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_completions_body() {
        let body = render(RequestShape::ChatCompletions, "hello", "gpt-4", GenerationParams::default());
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn gemini_body_nests_generation_config() {
        let body = render(
            RequestShape::GeminiGenerateContent,
            "hello",
            "gemini-pro",
            GenerationParams::default(),
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
        assert!(body.get("model").is_none());
    }

    #[test]
    fn azure_body_omits_model() {
        let body = render(
            RequestShape::AzureChatCompletions,
            "hello",
            "gpt-4o",
            GenerationParams::default(),
        );
        assert!(body.get("model").is_none());
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn bedrock_body_carries_anthropic_version() {
        let body = render(
            RequestShape::BedrockAnthropic,
            "hello",
            "anthropic.claude-v2",
            GenerationParams { max_tokens: 256, temperature: 0.2 },
        );
        assert_eq!(body["anthropic_version"], BEDROCK_ANTHROPIC_VERSION);
        assert_eq!(body["max_tokens"], 256);
    }
}
