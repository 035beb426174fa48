//! Protocol adaptation
//!
//! Turns a routing decision and a user message into the request the chosen
//! provider expects: URL, body and authentication headers.

pub mod lookup;
pub mod registry;

pub use lookup::{
    CredentialResolverTier, LookupKey, LookupTier, LookupValue, ScopeProperty, ScopePropertyTier,
    StaticUrlTier, TieredLookup, UrlResolverTier,
};
pub use registry::{CredentialResolver, EndpointUrlResolver, InMemoryRegistry, ProviderRegistry};

pub use crate::config::MissingCredentials;

use crate::config::{RequestChangeConfig, SecretString};
use crate::protocol::{EndpointRef, GenerationParams, OutboundRequest, RequestScope, UserMessage};
use crate::providers::{
    apply_auth_headers, templates, AuthScheme, ProviderCatalog, ProviderDetector, ProviderId,
    RequestShape,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while building an outbound request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("no request template for provider '{0}'")]
    UnsupportedProvider(String),

    #[error("no credentials found for endpoint '{endpoint_id}'")]
    CredentialsMissing { endpoint_id: String },

    #[error("no URL found for endpoint '{endpoint_id}'")]
    EndpointUrlMissing { endpoint_id: String },
}

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Builds provider-native requests for routed endpoints
pub struct ProtocolAdapter {
    catalog: Arc<ProviderCatalog>,
    urls: TieredLookup<String>,
    credentials: TieredLookup<SecretString>,
    providers: Option<Arc<dyn ProviderRegistry>>,
    missing_credentials: MissingCredentials,
}

impl Default for ProtocolAdapter {
    fn default() -> Self {
        ProtocolAdapterBuilder::new().build()
    }
}

impl ProtocolAdapter {
    pub fn builder() -> ProtocolAdapterBuilder {
        ProtocolAdapterBuilder::new()
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Build the upstream request for `chosen`
    pub fn adapt(
        &self,
        chosen: &EndpointRef,
        message: &UserMessage,
        scope: &RequestScope,
        params: GenerationParams,
    ) -> AdapterResult<OutboundRequest> {
        let key = LookupKey::new(chosen, scope);

        let (url, url_tier) = self.urls.resolve(&key).ok_or_else(|| AdapterError::EndpointUrlMissing {
            endpoint_id: chosen.endpoint_id.clone(),
        })?;

        let registered = self
            .providers
            .as_ref()
            .and_then(|registry| registry.provider_name(&chosen.endpoint_id))
            .filter(|name| !name.trim().is_empty());
        let provider = match registered.as_deref() {
            Some(name) => {
                let id = ProviderId::from_name(name);
                if id == ProviderId::Unknown {
                    warn!(provider = %name, endpoint_id = %chosen.endpoint_id, "registry names an unknown provider");
                }
                id
            }
            None => ProviderDetector::detect(Some(&chosen.model), Some(&url)),
        };

        let profile = self.catalog.profile(provider);
        let shape = profile.shape.ok_or_else(|| {
            AdapterError::UnsupportedProvider(registered.clone().unwrap_or_else(|| provider.to_string()))
        })?;

        let credential = self
            .credentials
            .resolve(&key.with_provider(provider))
            .map(|(credential, tier)| {
                debug!(tier, endpoint_id = %chosen.endpoint_id, "resolved credentials");
                credential
            });

        debug!(
            endpoint_id = %chosen.endpoint_id,
            %provider,
            url_tier,
            "adapting request"
        );

        self.build(
            &url,
            &chosen.endpoint_id,
            &chosen.model,
            provider,
            shape,
            profile.auth,
            credential.as_ref(),
            message,
            params,
        )
    }

    /// Build the upstream request for a direct target.
    ///
    /// URL and key come from `config`. A provider the catalog has no template
    /// for is sent an OpenAI-compatible body authenticated per `authType`.
    pub fn adapt_direct(
        &self,
        config: &RequestChangeConfig,
        message: &UserMessage,
    ) -> AdapterResult<OutboundRequest> {
        let provider = config.provider();
        let profile = self.catalog.profile(provider);

        let (shape, auth) = match profile.shape {
            Some(shape) => (shape, profile.auth),
            None => {
                debug!(
                    provider = config.explicit_provider_name().unwrap_or("unknown"),
                    auth_type = ?config.auth_type,
                    "unknown provider, sending an OpenAI-compatible body"
                );
                (RequestShape::ChatCompletions, config.auth_type.scheme())
            }
        };

        let credential = Some(&config.api_key).filter(|k| !k.is_blank());

        self.build(
            &config.endpoint,
            &config.endpoint,
            &config.model,
            provider,
            shape,
            auth,
            credential,
            message,
            config.generation_params(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        url: &str,
        endpoint_id: &str,
        model: &str,
        provider: ProviderId,
        shape: RequestShape,
        auth: AuthScheme,
        credential: Option<&SecretString>,
        message: &UserMessage,
        params: GenerationParams,
    ) -> AdapterResult<OutboundRequest> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        match credential {
            Some(credential) => apply_auth_headers(&mut headers, auth, credential),
            None if auth == AuthScheme::None => {}
            None => match self.missing_credentials {
                MissingCredentials::Proceed => {
                    warn!(%endpoint_id, %provider, "no credentials found, sending request without authentication");
                }
                MissingCredentials::Reject => {
                    return Err(AdapterError::CredentialsMissing {
                        endpoint_id: endpoint_id.to_string(),
                    });
                }
            },
        }

        Ok(OutboundRequest {
            url: url.to_string(),
            headers,
            body: templates::render(shape, message.text(), model, params),
            provider,
            model: model.to_string(),
        })
    }
}

/// Builder assembling the adapter's lookup tiers.
///
/// URL tiers: URL cache, URL registry, static catalog URL.
/// Credential tiers: credential cache, secure store, then the
/// `ENDPOINT_API_KEY_<id>`, `API_KEY_<PROVIDER>` and `API_KEY` scope properties.
pub struct ProtocolAdapterBuilder {
    catalog: ProviderCatalog,
    url_cache: Option<Arc<dyn EndpointUrlResolver>>,
    url_registry: Option<Arc<dyn EndpointUrlResolver>>,
    credential_cache: Option<Arc<dyn CredentialResolver>>,
    secure_store: Option<Arc<dyn CredentialResolver>>,
    providers: Option<Arc<dyn ProviderRegistry>>,
    missing_credentials: MissingCredentials,
}

impl Default for ProtocolAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapterBuilder {
    pub fn new() -> Self {
        Self {
            catalog: ProviderCatalog::builtin(),
            url_cache: None,
            url_registry: None,
            credential_cache: None,
            secure_store: None,
            providers: None,
            missing_credentials: MissingCredentials::default(),
        }
    }

    pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn url_cache(mut self, cache: Arc<dyn EndpointUrlResolver>) -> Self {
        self.url_cache = Some(cache);
        self
    }

    pub fn url_registry(mut self, registry: Arc<dyn EndpointUrlResolver>) -> Self {
        self.url_registry = Some(registry);
        self
    }

    pub fn credential_cache(mut self, cache: Arc<dyn CredentialResolver>) -> Self {
        self.credential_cache = Some(cache);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn CredentialResolver>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn provider_registry(mut self, registry: Arc<dyn ProviderRegistry>) -> Self {
        self.providers = Some(registry);
        self
    }

    /// Use one in-memory registry for URLs, credentials and provider names
    pub fn registry(self, registry: Arc<InMemoryRegistry>) -> Self {
        self.url_registry(registry.clone())
            .secure_store(registry.clone())
            .provider_registry(registry)
    }

    pub fn missing_credentials(mut self, policy: MissingCredentials) -> Self {
        self.missing_credentials = policy;
        self
    }

    pub fn build(self) -> ProtocolAdapter {
        let catalog = Arc::new(self.catalog);

        let mut urls = TieredLookup::new();
        if let Some(cache) = self.url_cache {
            urls = urls.then(UrlResolverTier::new("url-cache", cache));
        }
        if let Some(registry) = self.url_registry {
            urls = urls.then(UrlResolverTier::new("url-registry", registry));
        }
        urls = urls.then(StaticUrlTier::new(catalog.clone()));

        let mut credentials = TieredLookup::new();
        if let Some(cache) = self.credential_cache {
            credentials = credentials.then(CredentialResolverTier::new("credential-cache", cache));
        }
        if let Some(store) = self.secure_store {
            credentials = credentials.then(CredentialResolverTier::new("secure-store", store));
        }
        credentials = credentials
            .then(ScopePropertyTier::new(ScopeProperty::Endpoint, catalog.clone()))
            .then(ScopePropertyTier::new(ScopeProperty::Provider, catalog.clone()))
            .then(ScopePropertyTier::new(ScopeProperty::Global, catalog.clone()));

        ProtocolAdapter {
            catalog,
            urls,
            credentials,
            providers: self.providers,
            missing_credentials: self.missing_credentials,
        }
    }
}
