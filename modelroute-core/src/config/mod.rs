//! Configuration for the routing engine
//!
//! Two kinds of configuration live here:
//! - the gateway settings file ([`GatewaySettings`]), loaded once from YAML or JSON
//! - per-API routing policies, parsed from the JSON blobs publishers attach to an API

mod env;
mod error;
mod policy;
mod schema;
mod secrets;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use policy::{
    AuthType, CategoryRoute, DeploymentConfig, RequestChangeConfig, RequestChangeTarget,
    RoutingPolicy, SingleTargetPolicy,
};
pub use schema::{AdapterSettings, ClassifierSettings, EndpointEntry, GatewaySettings, MissingCredentials};
pub use secrets::{is_sensitive_name, redact_by_field_name, SafeLogging, SecretString};
pub use validator::ConfigValidator;

use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Load gateway settings from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<GatewaySettings> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let settings: GatewaySettings =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&settings)?;
    debug!(path = %path.display(), endpoints = settings.endpoints.len(), "loaded gateway settings");
    Ok(settings)
}

/// Load gateway settings from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<GatewaySettings> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let settings: GatewaySettings =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&settings)?;
    debug!(path = %path.display(), endpoints = settings.endpoints.len(), "loaded gateway settings");
    Ok(settings)
}

fn read_config(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

/// Undo the single-quote encoding the publisher UI applies to stored policies.
///
/// Only blobs that contain no double quote at all are rewritten, so a valid
/// JSON document with apostrophes inside strings is left alone.
pub fn normalize_policy_json(raw: &str) -> Cow<'_, str> {
    if raw.contains('\'') && !raw.contains('"') {
        Cow::Owned(raw.replace('\'', "\""))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Parse and validate a classifying-router policy blob
pub fn parse_routing_policy(raw: &str) -> ConfigResult<RoutingPolicy> {
    let json = normalize_policy_json(raw);
    let policy: RoutingPolicy = serde_json::from_str(&json).map_err(|e| {
        error!(error = %e, "routing policy is not valid JSON");
        ConfigError::inline_json("routing policy", &e)
    })?;

    ConfigValidator::new().validate_routing_policy(&policy).map_err(|e| {
        error!(error = %e, "routing policy failed validation");
        e
    })?;
    Ok(policy)
}

/// Parse and validate a request-change blob.
///
/// Objects carrying a `production` or `sandbox` key are per-environment
/// policies; anything else must be a direct target.
pub fn parse_request_change(raw: &str) -> ConfigResult<RequestChangeTarget> {
    let json = normalize_policy_json(raw);
    let value: Value = serde_json::from_str(&json).map_err(|e| {
        error!(error = %e, "request-change config is not valid JSON");
        ConfigError::inline_json("request-change config", &e)
    })?;

    let is_policy = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("production") || obj.contains_key("sandbox"));

    let validator = ConfigValidator::new();
    let target = if is_policy {
        let policy: SingleTargetPolicy = serde_json::from_value(value)
            .map_err(|e| ConfigError::inline_json("request-change policy", &e))?;
        validator.validate_single_target(&policy)?;
        RequestChangeTarget::Policy(policy)
    } else {
        let config: RequestChangeConfig = serde_json::from_value(value)
            .map_err(|e| ConfigError::inline_json("request-change config", &e))?;
        validator.validate_request_change(&config)?;
        RequestChangeTarget::Direct(config)
    };

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Environment;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "0.1"
classifier:
  url: https://api.mistral.ai/v1/chat/completions
  model: mistral-small-latest
  api_key: test-key
  timeout_ms: 2000
adapter:
  missing_credentials: reject
endpoints:
  - id: openai-prod
    url: https://api.openai.com/v1/chat/completions
    api_key: sk-test
"#;
        let settings: Result<GatewaySettings, _> = serde_yaml::from_str(yaml);
        assert!(settings.is_ok());
        let settings = settings.unwrap();
        assert_eq!(settings.adapter.missing_credentials, MissingCredentials::Reject);
        assert_eq!(settings.classifier.unwrap().timeout_ms, 2000);
    }

    #[test]
    fn test_single_quoted_policy_is_normalized() {
        let raw = "{'production':{'categories':{'code':{'endpointId':'epA','model':'gpt-4'}}},'suspendDuration':10}";
        let policy = parse_routing_policy(raw).unwrap();
        let prod = policy.deployment(Environment::Production).unwrap();
        assert_eq!(prod.categories["code"].endpoint.endpoint_id, "epA");
        assert_eq!(policy.suspend_duration, 10);
    }

    #[test]
    fn test_apostrophes_in_valid_json_are_kept() {
        let raw = r#"{"production":{"categories":[{"name":"code","context":"user's code","endpointId":"a","model":"m"}]}}"#;
        assert!(matches!(normalize_policy_json(raw), Cow::Borrowed(_)));
        let policy = parse_routing_policy(raw).unwrap();
        assert_eq!(
            policy.production.unwrap().categories["code"].context.as_deref(),
            Some("user's code")
        );
    }

    #[test]
    fn test_malformed_policy_is_a_parse_error() {
        assert!(matches!(
            parse_routing_policy("{not json"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_request_change_dispatch() {
        let policy = parse_request_change(r#"{"production":{"endpointId":"ep1","model":"gpt-4"}}"#).unwrap();
        assert!(matches!(policy, RequestChangeTarget::Policy(_)));

        let direct = parse_request_change(
            r#"{"apiKey":"k","model":"gpt-4","endpoint":"https://api.openai.com/v1/chat/completions","authType":"x-api-key"}"#,
        )
        .unwrap();
        match direct {
            RequestChangeTarget::Direct(config) => assert_eq!(config.auth_type, AuthType::XApiKey),
            other => panic!("expected direct target, got {:?}", other),
        }

        assert!(matches!(
            parse_request_change(r#"{"model":"gpt-4"}"#),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
