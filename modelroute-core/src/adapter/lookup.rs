//! Ordered lookup tiers
//!
//! URLs and credentials are resolved by walking a list of tiers and taking
//! the first non-blank answer. Tiers are plain strategy objects so callers
//! can add, drop or reorder sources without touching the adapter.

use super::registry::{CredentialResolver, EndpointUrlResolver};
use crate::config::SecretString;
use crate::protocol::{EndpointRef, RequestScope};
use crate::providers::{ProviderCatalog, ProviderDetector, ProviderId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Scope property holding a key for one endpoint: `ENDPOINT_API_KEY_<endpointId>`
pub const ENDPOINT_KEY_PROPERTY_PREFIX: &str = "ENDPOINT_API_KEY_";

/// Scope property holding a key for one provider: `API_KEY_<PROVIDER>`
pub const PROVIDER_KEY_PROPERTY_PREFIX: &str = "API_KEY_";

/// Scope property holding a key for any provider
pub const GLOBAL_KEY_PROPERTY: &str = "API_KEY";

/// What a tier gets to look at
#[derive(Debug, Clone, Copy)]
pub struct LookupKey<'a> {
    pub endpoint: &'a EndpointRef,
    pub scope: &'a RequestScope,
    /// Known once the URL is resolved; absent during URL lookup
    pub provider: Option<ProviderId>,
}

impl<'a> LookupKey<'a> {
    pub fn new(endpoint: &'a EndpointRef, scope: &'a RequestScope) -> Self {
        Self {
            endpoint,
            scope,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Values a tier may produce. Blank values count as a miss.
pub trait LookupValue {
    fn is_blank(&self) -> bool;
}

impl LookupValue for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl LookupValue for SecretString {
    fn is_blank(&self) -> bool {
        SecretString::is_blank(self)
    }
}

/// One source in an ordered lookup
pub trait LookupTier<T>: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    fn lookup(&self, key: &LookupKey<'_>) -> Option<T>;
}

/// First-non-blank-wins walk over a list of tiers
pub struct TieredLookup<T> {
    tiers: Vec<Box<dyn LookupTier<T>>>,
}

impl<T> Default for TieredLookup<T> {
    fn default() -> Self {
        Self { tiers: Vec::new() }
    }
}

impl<T: LookupValue> TieredLookup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tier after the existing ones
    pub fn then(mut self, tier: impl LookupTier<T> + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// The first non-blank value and the tier it came from
    pub fn resolve(&self, key: &LookupKey<'_>) -> Option<(T, &'static str)> {
        self.tiers.iter().find_map(|tier| {
            let value = tier.lookup(key).filter(|v| !v.is_blank())?;
            debug!(tier = tier.name(), endpoint_id = %key.endpoint.endpoint_id, "lookup hit");
            Some((value, tier.name()))
        })
    }
}

/// URL from an [`EndpointUrlResolver`]
pub struct UrlResolverTier {
    name: &'static str,
    resolver: Arc<dyn EndpointUrlResolver>,
}

impl UrlResolverTier {
    pub fn new(name: &'static str, resolver: Arc<dyn EndpointUrlResolver>) -> Self {
        Self { name, resolver }
    }
}

impl LookupTier<String> for UrlResolverTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, key: &LookupKey<'_>) -> Option<String> {
        self.resolver.endpoint_url(&key.endpoint.endpoint_id)
    }
}

/// Provider's well-known URL from the catalog.
///
/// The provider is guessed from the endpoint id, then from the model. A
/// provider without a fallback URL gets the OpenAI URL.
pub struct StaticUrlTier {
    catalog: Arc<ProviderCatalog>,
}

impl StaticUrlTier {
    pub fn new(catalog: Arc<ProviderCatalog>) -> Self {
        Self { catalog }
    }
}

impl LookupTier<String> for StaticUrlTier {
    fn name(&self) -> &'static str {
        "static"
    }

    fn lookup(&self, key: &LookupKey<'_>) -> Option<String> {
        let provider = ProviderDetector::detect_from_endpoint_id(&key.endpoint.endpoint_id)
            .unwrap_or_else(|| ProviderDetector::detect(Some(&key.endpoint.model), None));

        match &self.catalog.profile(provider).fallback_url {
            Some(url) => Some(url.clone()),
            None => {
                warn!(
                    %provider,
                    endpoint_id = %key.endpoint.endpoint_id,
                    "no static URL for provider, using the OpenAI URL"
                );
                self.catalog.profile(ProviderId::OpenAi).fallback_url.clone()
            }
        }
    }
}

/// Credential from a [`CredentialResolver`]
pub struct CredentialResolverTier {
    name: &'static str,
    resolver: Arc<dyn CredentialResolver>,
}

impl CredentialResolverTier {
    pub fn new(name: &'static str, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { name, resolver }
    }
}

impl LookupTier<SecretString> for CredentialResolverTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, key: &LookupKey<'_>) -> Option<SecretString> {
        self.resolver.credential(&key.endpoint.endpoint_id)
    }
}

/// Which request-scope property a [`ScopePropertyTier`] reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeProperty {
    /// `ENDPOINT_API_KEY_<endpointId>`
    Endpoint,
    /// `API_KEY_<PROVIDER>`, named by the resolved provider's property key
    Provider,
    /// `API_KEY`
    Global,
}

/// Credential from a request-scoped property
pub struct ScopePropertyTier {
    property: ScopeProperty,
    catalog: Arc<ProviderCatalog>,
}

impl ScopePropertyTier {
    pub fn new(property: ScopeProperty, catalog: Arc<ProviderCatalog>) -> Self {
        Self { property, catalog }
    }

    fn property_name(&self, key: &LookupKey<'_>) -> Option<String> {
        match self.property {
            ScopeProperty::Endpoint => Some(format!(
                "{}{}",
                ENDPOINT_KEY_PROPERTY_PREFIX, key.endpoint.endpoint_id
            )),
            ScopeProperty::Provider => {
                let suffix = self.catalog.profile(key.provider?).property_key?;
                Some(format!("{}{}", PROVIDER_KEY_PROPERTY_PREFIX, suffix))
            }
            ScopeProperty::Global => Some(GLOBAL_KEY_PROPERTY.to_string()),
        }
    }
}

impl LookupTier<SecretString> for ScopePropertyTier {
    fn name(&self) -> &'static str {
        match self.property {
            ScopeProperty::Endpoint => "scope:endpoint",
            ScopeProperty::Provider => "scope:provider",
            ScopeProperty::Global => "scope:global",
        }
    }

    fn lookup(&self, key: &LookupKey<'_>) -> Option<SecretString> {
        let name = self.property_name(key)?;
        key.scope.property(&name).map(SecretString::from)
    }
}
