//! Gateway-side endpoint registries
//!
//! The adapter consults these keyed lookups for an endpoint's URL, its
//! credential and its declared provider. Each is optional; a miss moves the
//! lookup on to the next tier.

use crate::config::{GatewaySettings, SecretString};
use dashmap::DashMap;

/// Endpoint id to upstream URL
pub trait EndpointUrlResolver: Send + Sync {
    fn endpoint_url(&self, endpoint_id: &str) -> Option<String>;
}

/// Endpoint id to API credential
pub trait CredentialResolver: Send + Sync {
    fn credential(&self, endpoint_id: &str) -> Option<SecretString>;
}

/// Endpoint id to declared provider name
pub trait ProviderRegistry: Send + Sync {
    fn provider_name(&self, endpoint_id: &str) -> Option<String>;
}

/// In-memory endpoint registry implementing all three lookups
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    urls: DashMap<String, String>,
    credentials: DashMap<String, SecretString>,
    providers: DashMap<String, String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated from the settings file's `endpoints` list
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        let registry = Self::new();
        for entry in &settings.endpoints {
            registry.set_url(&entry.id, &entry.url);
            if let Some(provider) = &entry.provider {
                registry.set_provider(&entry.id, provider);
            }
            if let Some(api_key) = &entry.api_key {
                registry.set_credential(&entry.id, api_key.clone());
            }
        }
        registry
    }

    pub fn set_url(&self, endpoint_id: &str, url: &str) {
        self.urls.insert(endpoint_id.to_string(), url.to_string());
    }

    pub fn set_credential(&self, endpoint_id: &str, credential: impl Into<SecretString>) {
        self.credentials
            .insert(endpoint_id.to_string(), credential.into());
    }

    pub fn set_provider(&self, endpoint_id: &str, provider: &str) {
        self.providers
            .insert(endpoint_id.to_string(), provider.to_string());
    }

    /// Drop everything known about an endpoint
    pub fn remove(&self, endpoint_id: &str) {
        self.urls.remove(endpoint_id);
        self.credentials.remove(endpoint_id);
        self.providers.remove(endpoint_id);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.credentials.is_empty() && self.providers.is_empty()
    }
}

impl EndpointUrlResolver for InMemoryRegistry {
    fn endpoint_url(&self, endpoint_id: &str) -> Option<String> {
        self.urls.get(endpoint_id).map(|url| url.value().clone())
    }
}

impl CredentialResolver for InMemoryRegistry {
    fn credential(&self, endpoint_id: &str) -> Option<SecretString> {
        self.credentials
            .get(endpoint_id)
            .map(|credential| credential.value().clone())
    }
}

impl ProviderRegistry for InMemoryRegistry {
    fn provider_name(&self, endpoint_id: &str) -> Option<String> {
        self.providers
            .get(endpoint_id)
            .map(|provider| provider.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_entries_populate_every_lookup() {
        let settings: GatewaySettings = serde_yaml::from_str(
            r#"
version: "0.1"
endpoints:
  - id: claude-prod
    url: https://api.anthropic.com/v1/messages
    provider: anthropic
    api_key: sk-ant-test
  - id: bare
    url: https://llm.internal/v1/chat/completions
"#,
        )
        .unwrap();
        let registry = InMemoryRegistry::from_settings(&settings);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.endpoint_url("claude-prod").as_deref(),
            Some("https://api.anthropic.com/v1/messages")
        );
        assert_eq!(registry.provider_name("claude-prod").as_deref(), Some("anthropic"));
        assert_eq!(
            registry.credential("claude-prod").map(|c| c.expose_secret().to_string()),
            Some("sk-ant-test".to_string())
        );
        assert!(registry.credential("bare").is_none());
        assert!(registry.provider_name("bare").is_none());

        registry.remove("claude-prod");
        assert!(registry.endpoint_url("claude-prod").is_none());
    }
}
