//! Routing Demo - policy routing, suspension fallback and request rewriting
//!
//! Routes a few prompts through a classifying-router policy without a
//! classifier model, so every request lands on the default endpoint until
//! that endpoint is suspended.
//!
//! Run with: cargo run --example routing_demo

use modelroute_core::config::{GatewaySettings, SafeLogging};
use modelroute_core::mediator::InboundRequest;
use modelroute_core::protocol::RequestScope;
use modelroute_core::routing::InMemoryHealthRegistry;
use modelroute_core::{MediationOutcome, RoutingEngine};
use std::sync::Arc;
use std::time::Duration;

const SETTINGS: &str = r#"
version: "0.1"
endpoints:
  - id: mistral-prod
    url: https://api.mistral.ai/v1/chat/completions
    api_key: demo-mistral-key
  - id: claude-backup
    url: https://api.anthropic.com/v1/messages
    api_key: demo-anthropic-key
"#;

const POLICY: &str = r#"{
    "production": {
        "categories": {"backup": {"endpointId": "claude-backup", "model": "claude-3-haiku"}},
        "defaultModel": {"endpointId": "mistral-prod", "model": "mistral-large"}
    },
    "suspendDuration": 60
}"#;

fn print_outcome(label: &str, outcome: &MediationOutcome) {
    println!("{}", label);
    match outcome {
        MediationOutcome::Rewritten(rewritten) => {
            println!("  -> {}", rewritten.request.safe_for_logging());
            println!("  body: {}", rewritten.request.body_string());
            println!("  fallback used: {}", rewritten.metadata.used_fallback);
        }
        MediationOutcome::Bypass(reason) => println!("  bypass ({})", reason),
        MediationOutcome::Reject(reason) => println!("  reject ({})", reason),
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings: GatewaySettings = serde_yaml::from_str(SETTINGS)?;
    settings.validate()?;

    let health = Arc::new(InMemoryHealthRegistry::new());
    let engine = RoutingEngine::with_health(&settings, health.clone())?;
    let mediator = engine.route_mediator(POLICY);
    let scope = RequestScope::new("demo-api");

    let chat = InboundRequest::from_key_type(
        r#"{"messages":[{"role":"user","content":"Explain ownership in one sentence"}]}"#,
        Some("PRODUCTION"),
        scope.clone(),
    );
    print_outcome("Default route:", &mediator.mediate(&chat).await?);

    health.suspend("demo-api", "mistral-prod_mistral-large", Duration::from_secs(60));
    print_outcome("Default endpoint suspended:", &mediator.mediate(&chat).await?);

    let sandbox = InboundRequest::from_key_type(r#"{"prompt":"hi"}"#, Some("SANDBOX"), scope);
    print_outcome("Sandbox key:", &mediator.mediate(&sandbox).await?);

    Ok(())
}
