//! Provider catalog
//!
//! Maps every known provider identity to its request shape, authentication
//! scheme and static fallback URL. Adding a provider means adding a
//! [`ProviderId`] variant and one row in [`ProviderCatalog::builtin`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Version header value Anthropic requires on every Messages API call
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Referer sent to OpenRouter so requests are attributed to the gateway
pub const OPENROUTER_REFERER: &str = "https://modelroute.dev";

/// Canonical provider identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    AzureOpenAi,
    Claude,
    Gemini,
    Mistral,
    AwsBedrock,
    HuggingFace,
    Cohere,
    OpenRouter,
    Palm,
    /// Any provider name the catalog does not recognize
    Unknown,
}

impl ProviderId {
    /// All variants, in table order
    pub const ALL: [ProviderId; 11] = [
        ProviderId::OpenAi,
        ProviderId::AzureOpenAi,
        ProviderId::Claude,
        ProviderId::Gemini,
        ProviderId::Mistral,
        ProviderId::AwsBedrock,
        ProviderId::HuggingFace,
        ProviderId::Cohere,
        ProviderId::OpenRouter,
        ProviderId::Palm,
        ProviderId::Unknown,
    ];

    /// Parse a provider name as it appears in registries and configuration.
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// (`anthropic`, `google`, `azure`, `bedrock`, `hf`, ...). Names that do not
    /// match any alias map to [`ProviderId::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            "azure" | "azureopenai" => Self::AzureOpenAi,
            "claude" | "anthropic" => Self::Claude,
            "gemini" | "google" => Self::Gemini,
            "mistral" | "mistralai" => Self::Mistral,
            "aws" | "bedrock" | "awsbedrock" => Self::AwsBedrock,
            "huggingface" | "hf" => Self::HuggingFace,
            "cohere" => Self::Cohere,
            "openrouter" => Self::OpenRouter,
            "palm" | "palmapi" => Self::Palm,
            _ => Self::Unknown,
        }
    }

    /// Canonical lowercase id
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azureopenai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Mistral => "mistral",
            Self::AwsBedrock => "awsbedrock",
            Self::HuggingFace => "huggingface",
            Self::Cohere => "cohere",
            Self::OpenRouter => "openrouter",
            Self::Palm => "palm",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a provider expects credentials to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Bearer token plus an `HTTP-Referer` header
    BearerWithReferer(&'static str),
    /// `x-api-key: <key>` plus `anthropic-version`
    Anthropic { version: &'static str },
    /// `x-goog-api-key` for `AIza...` API keys, bearer for OAuth tokens
    GoogleApiKey,
    /// A single named header carrying the raw key (Azure's `api-key`)
    ApiKeyHeader(&'static str),
    /// `Authorization: AWS4-HMAC-SHA256 <key>`.
    ///
    /// Placeholder only: real SigV4 request signing is not implemented.
    AwsSigV4Placeholder,
    /// No authentication header at all
    None,
}

/// How the outbound body embeds message, model, max tokens and temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// OpenAI-compatible `/chat/completions`
    ChatCompletions,
    /// Azure chat completions; the model is implied by the deployment URL
    AzureChatCompletions,
    /// Anthropic Messages API
    AnthropicMessages,
    /// Gemini `generateContent`
    GeminiGenerateContent,
    /// Anthropic models hosted on Bedrock `invoke`
    BedrockAnthropic,
    /// Cohere `/v1/chat`
    CohereChat,
    /// Hugging Face text-generation inference
    HuggingFaceInference,
    /// PaLM `generateText`
    PalmGenerateText,
}

/// Immutable description of one provider dialect
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub auth: AuthScheme,
    /// `None` means the template builder cannot produce a body for this provider
    pub shape: Option<RequestShape>,
    /// Static URL used when no registry knows the endpoint
    pub fallback_url: Option<String>,
    /// Suffix of the `API_KEY_<KEY>` request property holding this provider's key
    pub property_key: Option<&'static str>,
}

impl ProviderProfile {
    fn row(
        id: ProviderId,
        auth: AuthScheme,
        shape: Option<RequestShape>,
        fallback_url: Option<&str>,
        property_key: Option<&'static str>,
    ) -> Self {
        Self {
            id,
            auth,
            shape,
            fallback_url: fallback_url.map(str::to_string),
            property_key,
        }
    }
}

/// Lookup table from [`ProviderId`] to [`ProviderProfile`].
///
/// The built-in table covers every variant; individual rows can be replaced
/// with [`ProviderCatalog::with_profile`], e.g. to point the Azure fallback at
/// a real deployment.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    profiles: HashMap<ProviderId, ProviderProfile>,
}

impl ProviderCatalog {
    /// The built-in provider table
    pub fn builtin() -> Self {
        use AuthScheme as A;
        use ProviderId as P;
        use RequestShape as S;

        let rows = [
            ProviderProfile::row(
                P::OpenAi,
                A::Bearer,
                Some(S::ChatCompletions),
                Some("https://api.openai.com/v1/chat/completions"),
                Some("OPENAI"),
            ),
            ProviderProfile::row(
                P::AzureOpenAi,
                A::ApiKeyHeader("api-key"),
                Some(S::AzureChatCompletions),
                Some("https://your-azure-openai.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2023-05-15"),
                Some("AZURE"),
            ),
            ProviderProfile::row(
                P::Claude,
                A::Anthropic { version: ANTHROPIC_VERSION },
                Some(S::AnthropicMessages),
                Some("https://api.anthropic.com/v1/messages"),
                Some("CLAUDE"),
            ),
            ProviderProfile::row(
                P::Gemini,
                A::GoogleApiKey,
                Some(S::GeminiGenerateContent),
                Some("https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"),
                Some("GEMINI"),
            ),
            ProviderProfile::row(
                P::Mistral,
                A::Bearer,
                Some(S::ChatCompletions),
                Some("https://api.mistral.ai/v1/chat/completions"),
                Some("MISTRAL"),
            ),
            ProviderProfile::row(
                P::AwsBedrock,
                A::AwsSigV4Placeholder,
                Some(S::BedrockAnthropic),
                Some("https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-v2/invoke"),
                Some("BEDROCK"),
            ),
            ProviderProfile::row(
                P::HuggingFace,
                A::Bearer,
                Some(S::HuggingFaceInference),
                None,
                Some("HUGGINGFACE"),
            ),
            ProviderProfile::row(
                P::Cohere,
                A::Bearer,
                Some(S::CohereChat),
                Some("https://api.cohere.ai/v1/chat"),
                Some("COHERE"),
            ),
            ProviderProfile::row(
                P::OpenRouter,
                A::BearerWithReferer(OPENROUTER_REFERER),
                Some(S::ChatCompletions),
                Some("https://openrouter.ai/api/v1/chat/completions"),
                Some("OPENROUTER"),
            ),
            ProviderProfile::row(
                P::Palm,
                A::GoogleApiKey,
                Some(S::PalmGenerateText),
                Some("https://generativelanguage.googleapis.com/v1beta2/models/text-bison-001:generateText"),
                Some("PALM"),
            ),
            ProviderProfile::row(P::Unknown, A::Bearer, None, None, None),
        ];

        Self {
            profiles: rows.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Replace the row for `profile.id`
    pub fn with_profile(mut self, profile: ProviderProfile) -> Self {
        self.profiles.insert(profile.id, profile);
        self
    }

    /// Profile for a provider. Falls back to the `Unknown` row, which is
    /// always present in the built-in table.
    pub fn profile(&self, id: ProviderId) -> &ProviderProfile {
        self.profiles
            .get(&id)
            .or_else(|| self.profiles.get(&ProviderId::Unknown))
            .unwrap_or(&DEFAULT_PROFILE)
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

static DEFAULT_PROFILE: ProviderProfile = ProviderProfile {
    id: ProviderId::Unknown,
    auth: AuthScheme::Bearer,
    shape: None,
    fallback_url: None,
    property_key: None,
};
