//! Gateway mediators
//!
//! A mediator takes one inbound request and the routing configuration
//! attached to its API and decides what happens to it:
//!
//! - [`MediationOutcome::Bypass`]: forward the request unchanged
//! - [`MediationOutcome::Reject`]: send it to the reject endpoint
//! - [`MediationOutcome::Rewritten`]: replace URL, headers and body
//!
//! A [`MediationError`] means the request must fail.

pub mod request_change;
pub mod route;

pub use request_change::RequestChangeMediator;
pub use route::RouteMediator;

use crate::adapter::AdapterError;
use crate::config::{AdapterSettings, ConfigError, ValidationError};
use crate::protocol::{
    Environment, GenerationParams, OutboundRequest, RequestScope, RoutingMetadata,
};
use crate::routing::{RejectReason, RouteSelection};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// An inbound request as the gateway hands it to a mediator
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub payload: String,
    pub environment: Environment,
    pub scope: RequestScope,
}

impl InboundRequest {
    pub fn new(payload: impl Into<String>, environment: Environment, scope: RequestScope) -> Self {
        Self {
            payload: payload.into(),
            environment,
            scope,
        }
    }

    /// Build from the gateway's API key type tag (`PRODUCTION` or anything else)
    pub fn from_key_type(payload: impl Into<String>, key_type: Option<&str>, scope: RequestScope) -> Self {
        Self::new(payload, Environment::from_key_type(key_type), scope)
    }
}

/// Why a request was forwarded unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    /// No routing configuration is attached to the API
    EmptyConfig,
    /// The configuration has no target for the request's environment
    NoPolicyForEnvironment,
    /// No user message could be extracted from the payload
    NoUserMessage,
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::EmptyConfig => "empty_config",
            Self::NoPolicyForEnvironment => "no_policy_for_environment",
            Self::NoUserMessage => "no_user_message",
        };
        f.write_str(reason)
    }
}

/// The request to send upstream and the routing facts behind it
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenRequest {
    pub request: OutboundRequest,
    pub metadata: RoutingMetadata,
}

/// What to do with an inbound request
#[derive(Debug, Clone, PartialEq)]
pub enum MediationOutcome {
    Bypass(BypassReason),
    Reject(RejectReason),
    Rewritten(Box<RewrittenRequest>),
}

impl MediationOutcome {
    pub fn rewritten(&self) -> Option<&RewrittenRequest> {
        match self {
            MediationOutcome::Rewritten(rewritten) => Some(rewritten),
            _ => None,
        }
    }
}

/// Failures that must fail the request
#[derive(Debug, Clone, Error)]
pub enum MediationError {
    #[error("routing config could not be parsed: {0}")]
    ConfigParse(Arc<ConfigError>),

    #[error("routing config is invalid: {0}")]
    Validation(Arc<ValidationError>),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl From<ConfigError> for MediationError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(e) => MediationError::Validation(Arc::new(e)),
            other => MediationError::ConfigParse(Arc::new(other)),
        }
    }
}

/// Defaults the mediators apply to every rewritten request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediatorSettings {
    pub params: GenerationParams,
    /// Upstream timeout suggested to the transport layer
    pub timeout_ms: u64,
}

impl Default for MediatorSettings {
    fn default() -> Self {
        Self {
            params: GenerationParams::default(),
            timeout_ms: 30_000,
        }
    }
}

impl From<&AdapterSettings> for MediatorSettings {
    fn from(settings: &AdapterSettings) -> Self {
        Self {
            params: GenerationParams {
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
            },
            timeout_ms: settings.timeout_ms,
        }
    }
}

/// Parse state of a mediator's configuration, fixed at construction
pub(crate) type ParsedConfig<T> = Result<Option<T>, MediationError>;

/// Parse `raw` once; a blank string means "no configuration"
pub(crate) fn parse_config<T>(raw: &str, parse: impl FnOnce(&str) -> Result<T, ConfigError>) -> ParsedConfig<T> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse(raw).map(Some).map_err(MediationError::from)
}

pub(crate) fn metadata_for(
    selection: &RouteSelection,
    request: &OutboundRequest,
    timeout_ms: u64,
) -> RoutingMetadata {
    RoutingMetadata {
        request_id: Uuid::new_v4(),
        endpoint_id: selection.endpoint.endpoint_id.clone(),
        provider: request.provider,
        model: request.model.clone(),
        category: selection.category.clone(),
        used_fallback: selection.used_fallback,
        timeout_ms,
        suspend_duration_ms: selection.suspend_duration.as_millis() as u64,
        request_changed: true,
    }
}
