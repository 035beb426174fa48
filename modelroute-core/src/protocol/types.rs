//! Core protocol types shared by the resolver, the adapter and the mediators
//!
//! These are the values that cross component boundaries: where a request is
//! going ([`EndpointRef`]), on whose behalf ([`Environment`], [`RequestScope`]),
//! what the caller said ([`UserMessage`]) and what the gateway sends
//! upstream ([`OutboundRequest`], [`RoutingMetadata`]).

use crate::config::{redact_by_field_name, SafeLogging};
use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Deployment axis routing policies are split along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// Map the gateway's API key type to an environment.
    ///
    /// Only `PRODUCTION` keys route to production; every other key type,
    /// including a missing one, is treated as sandbox.
    pub fn from_key_type(key_type: Option<&str>) -> Self {
        match key_type {
            Some(k) if k.trim().eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Sandbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// A configured upstream target: an endpoint id bound to a model name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRef {
    #[serde(default)]
    pub endpoint_id: String,
    #[serde(default)]
    pub model: String,
}

impl EndpointRef {
    pub fn new(endpoint_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            model: model.into(),
        }
    }

    /// Both the endpoint id and the model are non-blank
    pub fn is_valid(&self) -> bool {
        !self.endpoint_id.trim().is_empty() && !self.model.trim().is_empty()
    }

    /// Key used to namespace health state for this endpoint.
    ///
    /// `<endpointId>_<model>`, the format the failure tracker writes
    /// suspensions under. The key is not injective (`a_b`/`c` and `a`/`b_c`
    /// collide), so compare refs, not keys, to tell endpoints apart.
    pub fn endpoint_key(&self) -> String {
        format!("{}_{}", self.endpoint_id, self.model)
    }
}

/// The single message extracted from an inbound payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    text: String,
    raw: String,
}

impl UserMessage {
    pub fn new(text: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: raw.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The payload the message was extracted from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whitespace-only messages count as no message at all
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Request-scoped lookup context handed in by the transport layer
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    /// Namespaces health and credential lookups (typically the API key)
    pub key: String,
    properties: HashMap<String, String>,
}

impl RequestScope {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            properties: HashMap::new(),
        }
    }

    /// Attach a request-scoped property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// A property value, ignoring blank entries
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Generation parameters embedded into every outbound body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// The rewritten request the transport layer sends upstream.
///
/// The HTTP method is left unchanged by the gateway.
#[derive(Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub provider: ProviderId,
    pub model: String,
}

impl OutboundRequest {
    /// Serialized JSON body
    pub fn body_string(&self) -> String {
        self.body.to_string()
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True when any credential-bearing header is present
    pub fn is_authenticated(&self) -> bool {
        ["authorization", "x-api-key", "api-key", "x-goog-api-key"]
            .iter()
            .any(|h| self.header(h).is_some())
    }
}

impl SafeLogging for OutboundRequest {
    fn safe_for_logging(&self) -> String {
        let mut headers: Vec<String> = self
            .headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, redact_by_field_name(k, v)))
            .collect();
        headers.sort();
        format!(
            "{} {} [{}] model={}",
            self.provider,
            self.url,
            headers.join(", "),
            self.model
        )
    }
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("request", &self.safe_for_logging())
            .field("body", &self.body)
            .finish()
    }
}

/// Routing facts handed to downstream gateway components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetadata {
    pub request_id: Uuid,
    pub endpoint_id: String,
    pub provider: ProviderId,
    pub model: String,
    /// Category the classifier placed the request in, if any
    pub category: Option<String>,
    /// Whether the default endpoint replaced a suspended choice
    pub used_fallback: bool,
    pub timeout_ms: u64,
    /// Suspension the failure tracker should apply if this endpoint fails
    pub suspend_duration_ms: u64,
    /// The payload was replaced by the gateway
    pub request_changed: bool,
}
