//! Secrets survive persistence but never reach logs

use modelroute_core::config::{redact_by_field_name, RequestChangeConfig, SafeLogging, SecretString};
use modelroute_core::protocol::{EndpointRef, GenerationParams, RequestScope, UserMessage};
use modelroute_core::ProtocolAdapter;

#[test]
fn request_change_config_keeps_api_key_when_serialized() {
    let config = RequestChangeConfig::new(
        "sk-secret-key-123",
        "gpt-4",
        "https://api.openai.com/v1/chat/completions",
    );

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""apiKey":"sk-secret-key-123""#));
    assert!(!json.contains("providerName"));

    let restored: RequestChangeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
    assert_eq!(restored.api_key.expose_secret(), "sk-secret-key-123");

    let debug_output = format!("{:?}", restored);
    assert!(!debug_output.contains("sk-secret-key-123"));
    assert!(debug_output.contains("[REDACTED]"));
}

#[test]
fn yaml_round_trip_keeps_secret() {
    let secret = SecretString::new("my-api-key-value");
    let yaml = serde_yaml::to_string(&secret).unwrap();
    let restored: SecretString = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(restored.expose_secret(), "my-api-key-value");
    assert_eq!(format!("{}", restored), "[REDACTED]");
}

#[test]
fn outbound_request_debug_hides_credentials() {
    let adapter = ProtocolAdapter::default();
    let scope = RequestScope::new("api").with_property("API_KEY", "sk-live-abcdef123456");
    let request = adapter
        .adapt(
            &EndpointRef::new("openai-prod", "gpt-4"),
            &UserMessage::new("hi", r#"{"prompt":"hi"}"#),
            &scope,
            GenerationParams::default(),
        )
        .unwrap();

    assert_eq!(request.header("authorization"), Some("Bearer sk-live-abcdef123456"));
    assert!(!format!("{:?}", request).contains("sk-live-abcdef123456"));
    assert!(!request.safe_for_logging().contains("sk-live-abcdef123456"));
}

#[test]
fn redaction_by_field_name() {
    assert_eq!(redact_by_field_name("api_key", "sk-abc"), "[REDACTED]");
    assert_eq!(redact_by_field_name("model", "gpt-4"), "gpt-4");
}
