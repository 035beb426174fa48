//! Provider detection from model names and endpoint URLs
//!
//! Model vocabulary is the primary signal. The exception is model names that
//! exist on both OpenAI and Azure (`gpt-4o`, `gpt-4-turbo`), where the
//! endpoint URL decides.

use super::catalog::ProviderId;

/// Model names served by both OpenAI and Azure OpenAI
const AMBIGUOUS_MODELS: [&str; 2] = ["gpt-4o", "gpt-4-turbo"];

/// Endpoint host fragments, checked in order
const ENDPOINT_PATTERNS: [(&[&str], ProviderId); 6] = [
    (&["azure.com", "openai.azure.com"], ProviderId::AzureOpenAi),
    (&["anthropic.com"], ProviderId::Claude),
    (&["generativelanguage.googleapis.com"], ProviderId::Gemini),
    (&["mistral.ai"], ProviderId::Mistral),
    (&["bedrock", "amazonaws.com"], ProviderId::AwsBedrock),
    (&["openai.com"], ProviderId::OpenAi),
];

/// Model name fragments, checked in order after the GPT rules
const MODEL_PATTERNS: [(&[&str], ProviderId); 4] = [
    (&["claude"], ProviderId::Claude),
    (&["gemini"], ProviderId::Gemini),
    (&["mistral"], ProviderId::Mistral),
    (&["bedrock", "aws"], ProviderId::AwsBedrock),
];

/// Stateless provider detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderDetector;

impl ProviderDetector {
    /// Infer the provider serving `model` at `endpoint`.
    ///
    /// Pure function of its inputs. Falls back to [`ProviderId::OpenAi`].
    pub fn detect(model: Option<&str>, endpoint: Option<&str>) -> ProviderId {
        let Some(model) = model else {
            return ProviderId::OpenAi;
        };
        let model = model.to_lowercase();

        if AMBIGUOUS_MODELS.iter().any(|m| model.contains(m)) {
            return Self::detect_from_endpoint(endpoint);
        }

        if model.contains("gpt") || model.contains("openai") {
            return if Self::is_azure_endpoint(endpoint) {
                ProviderId::AzureOpenAi
            } else {
                ProviderId::OpenAi
            };
        }

        MODEL_PATTERNS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| model.contains(n)))
            .map(|(_, id)| *id)
            .unwrap_or_else(|| Self::detect_from_endpoint(endpoint))
    }

    /// Infer the provider from the endpoint URL alone
    pub fn detect_from_endpoint(endpoint: Option<&str>) -> ProviderId {
        let Some(endpoint) = endpoint else {
            return ProviderId::OpenAi;
        };
        let endpoint = endpoint.to_lowercase();

        ENDPOINT_PATTERNS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| endpoint.contains(n)))
            .map(|(_, id)| *id)
            .unwrap_or(ProviderId::OpenAi)
    }

    /// Provider hinted at by an endpoint id such as `claude-prod` or
    /// `azure-gpt4-eu`. Returns `None` when the id carries no hint.
    pub fn detect_from_endpoint_id(endpoint_id: &str) -> Option<ProviderId> {
        let id = endpoint_id.trim().to_lowercase();
        if id.is_empty() {
            return None;
        }

        if id.contains("claude") || id.contains("anthropic") {
            Some(ProviderId::Claude)
        } else if id.contains("openai") && !id.contains("azure") {
            Some(ProviderId::OpenAi)
        } else if id.contains("gemini") || id.contains("google") {
            Some(ProviderId::Gemini)
        } else if id.contains("mistral") {
            Some(ProviderId::Mistral)
        } else if id.contains("azure") {
            Some(ProviderId::AzureOpenAi)
        } else if id.contains("bedrock") || id.contains("aws") {
            Some(ProviderId::AwsBedrock)
        } else {
            None
        }
    }

    fn is_azure_endpoint(endpoint: Option<&str>) -> bool {
        endpoint.is_some_and(|e| {
            let e = e.to_lowercase();
            e.contains("azure.com") || e.contains("openai.azure.com")
        })
    }
}
