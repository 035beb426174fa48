//! Routing policy blobs
//!
//! Policies arrive as JSON strings attached to an API by the publisher:
//!
//! - [`RoutingPolicy`] for the classifying router:
//!   `{"production": {"categories": {...}, "defaultModel": {...}}, "sandbox": {...}, "suspendDuration": 30}`
//! - [`SingleTargetPolicy`] for request-change mediation:
//!   `{"production": {"endpointId": "...", "model": "..."}, "sandbox": {...}}`
//! - [`RequestChangeConfig`] for a direct target with its own URL and key

use super::secrets::SecretString;
use crate::protocol::{EndpointRef, Environment, GenerationParams};
use crate::providers::{AuthScheme, ProviderDetector, ProviderId};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-environment policy for the classifying router
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPolicy {
    #[serde(default)]
    pub production: Option<DeploymentConfig>,

    #[serde(default)]
    pub sandbox: Option<DeploymentConfig>,

    /// Seconds a failing endpoint should stay suspended
    #[serde(default)]
    pub suspend_duration: i64,
}

impl RoutingPolicy {
    /// The deployment config selected by the request's environment
    pub fn deployment(&self, env: Environment) -> Option<&DeploymentConfig> {
        match env {
            Environment::Production => self.production.as_ref(),
            Environment::Sandbox => self.sandbox.as_ref(),
        }
    }

    /// Suspend duration, with negative values clamped to zero
    pub fn suspend_duration(&self) -> Duration {
        Duration::from_secs(self.suspend_duration.max(0) as u64)
    }
}

/// Routing table for one environment
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    /// Category name to endpoint, kept sorted so candidate order is stable
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub categories: BTreeMap<String, CategoryRoute>,

    /// Endpoint used when no category applies
    #[serde(default, alias = "defaultEndpoint")]
    pub default_model: Option<EndpointRef>,
}

impl DeploymentConfig {
    /// Category names whose endpoint reference is valid, in sorted order
    pub fn candidate_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, route)| route.endpoint.is_valid())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The default endpoint, if configured and valid
    pub fn default_endpoint(&self) -> Option<&EndpointRef> {
        self.default_model.as_ref().filter(|ep| ep.is_valid())
    }

    /// Routes nothing: no valid category and no valid default
    pub fn is_empty(&self) -> bool {
        self.candidate_categories().is_empty() && self.default_endpoint().is_none()
    }
}

/// Endpoint a category routes to, plus an optional routing hint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryRoute {
    #[serde(flatten)]
    pub endpoint: EndpointRef,

    /// Free-text description of which requests belong to this category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl CategoryRoute {
    pub fn new(endpoint: EndpointRef) -> Self {
        Self {
            endpoint,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// List form emitted by the publisher UI
#[derive(Deserialize)]
struct NamedCategory {
    name: String,
    #[serde(flatten)]
    route: CategoryRoute,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesRepr {
    Map(BTreeMap<String, CategoryRoute>),
    List(Vec<NamedCategory>),
    Null(()),
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<BTreeMap<String, CategoryRoute>, D::Error>
where
    D: Deserializer<'de>,
{
    match CategoriesRepr::deserialize(deserializer)? {
        CategoriesRepr::Map(map) => Ok(map),
        CategoriesRepr::Null(()) => Ok(BTreeMap::new()),
        CategoriesRepr::List(list) => {
            let mut map = BTreeMap::new();
            for NamedCategory { name, route } in list {
                if map.insert(name.clone(), route).is_some() {
                    return Err(de::Error::custom(format!("duplicate category name '{}'", name)));
                }
            }
            Ok(map)
        }
    }
}

/// One fixed endpoint per environment
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SingleTargetPolicy {
    #[serde(default)]
    pub production: Option<EndpointRef>,

    #[serde(default)]
    pub sandbox: Option<EndpointRef>,
}

impl SingleTargetPolicy {
    pub fn target(&self, env: Environment) -> Option<&EndpointRef> {
        match env {
            Environment::Production => self.production.as_ref(),
            Environment::Sandbox => self.sandbox.as_ref(),
        }
    }
}

/// Authentication used by a direct target whose provider is not recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    #[default]
    Bearer,
    ApiKey,
    XApiKey,
    None,
}

impl AuthType {
    pub fn scheme(&self) -> AuthScheme {
        match self {
            AuthType::Bearer => AuthScheme::Bearer,
            AuthType::ApiKey => AuthScheme::ApiKeyHeader("api-key"),
            AuthType::XApiKey => AuthScheme::ApiKeyHeader("x-api-key"),
            AuthType::None => AuthScheme::None,
        }
    }
}

fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f64 { 0.7 }

/// Direct single-endpoint target: raw URL, key and model in one blob
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChangeConfig {
    pub api_key: SecretString,
    pub model: String,
    pub endpoint: String,

    /// Explicit provider override; when absent the provider is derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_name: Option<String>,

    #[serde(default)]
    pub auth_type: AuthType,

    /// Upstream timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl RequestChangeConfig {
    pub fn new(
        api_key: impl Into<SecretString>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            provider_name: None,
            auth_type: AuthType::default(),
            timeout: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }

    /// The provider serving this target.
    ///
    /// An explicit `providerName` wins; otherwise the provider is recomputed
    /// from the current model and endpoint on every call.
    pub fn provider(&self) -> ProviderId {
        match self.provider_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => ProviderId::from_name(name),
            None => ProviderDetector::detect(Some(&self.model), Some(&self.endpoint)),
        }
    }

    /// The explicit provider override, if any
    pub fn explicit_provider_name(&self) -> Option<&str> {
        self.provider_name.as_deref()
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Request-change configuration: either an endpoint per environment or a
/// direct target
#[derive(Debug, Clone, PartialEq)]
pub enum RequestChangeTarget {
    Policy(SingleTargetPolicy),
    Direct(RequestChangeConfig),
}
