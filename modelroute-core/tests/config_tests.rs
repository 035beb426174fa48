//! Integration tests for settings loading and routing config parsing

use modelroute_core::config::{
    load_from_json, load_from_yaml, parse_request_change, parse_routing_policy, ConfigError,
    MissingCredentials, RequestChangeTarget, ValidationErrorKind,
};
use modelroute_core::protocol::{EndpointRef, Environment};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_settings() {
    std::env::set_var("MODELROUTE_IT_CLASSIFIER_KEY", "classifier-key");
    std::env::set_var("MODELROUTE_IT_MISTRAL_KEY", "mistral-key");

    let yaml = r#"
version: "0.1"
classifier:
  url: https://api.openai.com/v1/chat/completions
  model: gpt-4o-mini
  api_key: ${MODELROUTE_IT_CLASSIFIER_KEY}
  timeout_ms: 2000
adapter:
  missing_credentials: reject
  max_tokens: 512
endpoints:
  - id: mistral-prod
    url: https://api.mistral.ai/v1/chat/completions
    api_key: ${MODELROUTE_IT_MISTRAL_KEY}
  - id: claude-prod
    url: https://api.anthropic.com/v1/messages
    provider: anthropic
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    let settings = load_from_yaml(path).unwrap();
    assert_eq!(settings.version, "0.1");

    let classifier = settings.classifier.as_ref().unwrap();
    assert_eq!(classifier.api_key.expose_secret(), "classifier-key");
    assert_eq!(classifier.timeout_ms, 2000);
    assert!(classifier.enabled);

    assert_eq!(settings.adapter.missing_credentials, MissingCredentials::Reject);
    assert_eq!(settings.adapter.max_tokens, 512);
    assert_eq!(settings.adapter.timeout_ms, 30000);
    assert_eq!(settings.adapter.temperature, 0.7);

    assert_eq!(settings.endpoints.len(), 2);
    assert_eq!(
        settings.endpoints[0].api_key.as_ref().map(|k| k.expose_secret()),
        Some("mistral-key")
    );
    assert_eq!(settings.endpoints[1].provider.as_deref(), Some("anthropic"));

    std::env::remove_var("MODELROUTE_IT_CLASSIFIER_KEY");
    std::env::remove_var("MODELROUTE_IT_MISTRAL_KEY");
}

#[test]
fn test_load_valid_json_settings() {
    let json = r#"{
  "version": "0.1",
  "endpoints": [
    {"id": "openai-prod", "url": "https://api.openai.com/v1/chat/completions"}
  ]
}"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.json", json);

    let settings = load_from_json(path).unwrap();
    assert!(settings.classifier.is_none());
    assert_eq!(settings.adapter.missing_credentials, MissingCredentials::Proceed);
    assert_eq!(settings.endpoints[0].id, "openai-prod");
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
version: "0.1"
classifier:
  url: https://classifier.internal/v1/chat/completions
  model: small
  api_key: ${MODELROUTE_IT_DEFINITELY_UNSET}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => {
            assert_eq!(var, "MODELROUTE_IT_DEFINITELY_UNSET");
        }
        other => panic!("expected EnvVarNotFound, got {:?}", other),
    }
}

#[test]
fn test_unsupported_version() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", "version: \"2.0\"\n");

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "version");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidValue { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_endpoint_ids() {
    let yaml = r#"
version: "0.1"
endpoints:
  - id: ep1
    url: https://api.openai.com/v1/chat/completions
  - id: ep1
    url: https://api.mistral.ai/v1/chat/completions
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "endpoints[1].id");
            assert!(matches!(e.kind, ValidationErrorKind::DuplicateValue { .. }));
        }
        other => panic!("expected duplicate error, got {:?}", other),
    }
}

#[test]
fn test_yaml_parse_error_reports_location() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", "version: \"0.1\"\nendpoints: [\n");

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_rejected() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.json", r#"{"version":"0.1","providers":[]}"#);
    assert!(matches!(load_from_json(path), Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(matches!(load_from_yaml(missing), Err(ConfigError::IoError { .. })));
}

#[test]
fn routing_policy_with_list_categories_and_single_quotes() {
    let raw = "{'production':{'categories':[{'name':'code','endpointId':'epA','model':'gpt-4'}],\
               'defaultModel':{'endpointId':'epC','model':'mistral-large'}},'suspendDuration':30}";

    let policy = parse_routing_policy(raw).unwrap();
    let production = policy.deployment(Environment::Production).unwrap();
    assert_eq!(production.candidate_categories(), vec!["code"]);
    assert_eq!(
        production.default_endpoint(),
        Some(&EndpointRef::new("epC", "mistral-large"))
    );
    assert_eq!(policy.suspend_duration(), Duration::from_secs(30));
    assert!(policy.deployment(Environment::Sandbox).is_none());
}

#[test]
fn routing_policy_rejects_duplicate_category_names() {
    let raw = r#"{"production":{"categories":[
        {"name":"code","endpointId":"a","model":"m"},
        {"name":"code","endpointId":"b","model":"m"}
    ]}}"#;
    assert!(matches!(parse_routing_policy(raw), Err(ConfigError::ParseError { .. })));
}

#[test]
fn request_change_dispatches_on_shape() {
    let policy = parse_request_change(
        r#"{"production":{"endpointId":"ep1","model":"gpt-4"}}"#,
    )
    .unwrap();
    assert!(matches!(policy, RequestChangeTarget::Policy(_)));

    let direct = parse_request_change(
        r#"{"apiKey":"k","model":"gpt-4","endpoint":"https://api.openai.com/v1/chat/completions","maxTokens":64}"#,
    )
    .unwrap();
    match direct {
        RequestChangeTarget::Direct(config) => {
            assert_eq!(config.max_tokens, 64);
            assert_eq!(config.timeout, 30000);
        }
        other => panic!("expected direct config, got {:?}", other),
    }
}

#[test]
fn request_change_validation_names_the_field() {
    let err = parse_request_change(r#"{"sandbox":{"endpointId":"ep1","model":""}}"#).unwrap_err();
    match err {
        ConfigError::ValidationError(e) => assert_eq!(e.field_path, "sandbox.model"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let err = parse_request_change(r#"{"apiKey":"k","model":"gpt-4","endpoint":"ftp://x"}"#).unwrap_err();
    match err {
        ConfigError::ValidationError(e) => {
            assert_eq!(e.field_path, "endpoint");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
