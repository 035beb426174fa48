//! Validation rules for settings files and routing policies

use super::error::ValidationError;
use super::policy::{RequestChangeConfig, RoutingPolicy, SingleTargetPolicy};
use super::schema::{validate_generation, validate_url, GatewaySettings};
use crate::protocol::EndpointRef;
use tracing::warn;

/// Validator applied after every successful parse
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a settings file
    pub fn validate(&self, settings: &GatewaySettings) -> Result<(), ValidationError> {
        settings.validate()?;

        for (i, endpoint) in settings.endpoints.iter().enumerate() {
            if endpoint.api_key.as_ref().is_some_and(|k| k.is_blank()) {
                warn!(endpoint = %endpoint.id, "endpoints[{}].api_key is blank; credential lookup falls through", i);
            }
        }

        Ok(())
    }

    /// Validate a classifying-router policy.
    ///
    /// Incomplete endpoint references are tolerated here; the resolver
    /// leaves them out of classification.
    pub fn validate_routing_policy(&self, policy: &RoutingPolicy) -> Result<(), ValidationError> {
        if policy.suspend_duration < 0 {
            return Err(ValidationError::out_of_range(
                "suspendDuration",
                format!("suspendDuration must not be negative, got {}", policy.suspend_duration),
            ));
        }

        for (env, deployment) in [("production", &policy.production), ("sandbox", &policy.sandbox)] {
            let Some(deployment) = deployment else { continue };

            for (name, route) in &deployment.categories {
                if name.trim().is_empty() {
                    return Err(ValidationError::required(format!("{}.categories.name", env)));
                }
                if !route.endpoint.is_valid() {
                    warn!(env, category = %name, "category has an incomplete endpoint reference and will not be offered to the classifier");
                }
            }

            if deployment.is_empty() {
                warn!(env, "deployment routes nothing: no valid category and no default model");
            }
        }

        Ok(())
    }

    /// Validate a one-endpoint-per-environment policy
    pub fn validate_single_target(&self, policy: &SingleTargetPolicy) -> Result<(), ValidationError> {
        if policy.production.is_none() && policy.sandbox.is_none() {
            return Err(ValidationError::required("production")
                .with_context("a policy needs at least one of production or sandbox"));
        }

        if let Some(ep) = &policy.production {
            validate_endpoint_ref("production", ep)?;
        }
        if let Some(ep) = &policy.sandbox {
            validate_endpoint_ref("sandbox", ep)?;
        }

        Ok(())
    }

    /// Validate a direct request-change target
    pub fn validate_request_change(&self, config: &RequestChangeConfig) -> Result<(), ValidationError> {
        if config.model.trim().is_empty() {
            return Err(ValidationError::required("model"));
        }

        validate_url("endpoint", &config.endpoint)?;
        validate_generation("maxTokens", config.max_tokens, "temperature", config.temperature)?;

        if config.timeout == 0 {
            return Err(ValidationError::out_of_range("timeout", "Timeout must be greater than 0"));
        }

        if config.api_key.is_blank() {
            warn!("request-change config has an empty apiKey; upstream calls will be unauthenticated");
        }

        Ok(())
    }
}

fn validate_endpoint_ref(path: &str, ep: &EndpointRef) -> Result<(), ValidationError> {
    if ep.endpoint_id.trim().is_empty() {
        return Err(ValidationError::required(format!("{}.endpointId", path)));
    }
    if ep.model.trim().is_empty() {
        return Err(ValidationError::required(format!("{}.model", path)));
    }
    Ok(())
}
