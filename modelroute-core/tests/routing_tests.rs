//! Endpoint resolution tests with scripted classifiers

use async_trait::async_trait;
use modelroute_core::config::parse_routing_policy;
use modelroute_core::protocol::{EndpointRef, Environment, UserMessage};
use modelroute_core::routing::{
    ClassifierError, EndpointResolver, InMemoryHealthRegistry, RejectReason, Resolution,
    TextClassifier,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Classifier returning a fixed answer and recording its prompts
struct ScriptedClassifier {
    answer: Result<Option<String>, ()>,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(Some(answer.to_string())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err(()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn slow(answer: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(Some(answer.to_string())),
            delay,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextClassifier for ScriptedClassifier {
    fn is_available(&self) -> bool {
        true
    }

    async fn classify(&self, prompt: &str) -> Result<Option<String>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer
            .clone()
            .map_err(|()| ClassifierError::MalformedResponse("scripted failure".to_string()))
    }
}

const POLICY: &str = r#"{
    "production": {
        "categories": {
            "code": {"endpointId": "epA", "model": "gpt-4", "context": "programming and debugging"},
            "chat": {"endpointId": "epB", "model": "claude-3-haiku"}
        },
        "defaultModel": {"endpointId": "epC", "model": "mistral-large"}
    },
    "sandbox": {
        "defaultModel": {"endpointId": "epS", "model": "gpt-4o-mini"}
    },
    "suspendDuration": 45
}"#;

fn message(text: &str) -> UserMessage {
    UserMessage::new(text, format!(r#"{{"prompt":"{}"}}"#, text))
}

fn routed(resolution: Resolution) -> EndpointRef {
    match resolution {
        Resolution::Routed(selection) => selection.endpoint,
        other => panic!("expected a routed resolution, got {:?}", other),
    }
}

#[tokio::test]
async fn unmatched_category_uses_default() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::answering("math");
    let resolver = EndpointResolver::new().with_classifier(classifier.clone());

    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("integrate x")), "api")
        .await;

    assert_eq!(routed(resolution), EndpointRef::new("epC", "mistral-large"));
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn matched_category_routes_and_prompt_carries_contexts() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::answering("Code");
    let resolver = EndpointResolver::new().with_classifier(classifier.clone());

    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("fix my loop")), "api")
        .await;

    match resolution {
        Resolution::Routed(selection) => {
            assert_eq!(selection.endpoint, EndpointRef::new("epA", "gpt-4"));
            assert_eq!(selection.category.as_deref(), Some("code"));
            assert!(!selection.used_fallback);
            assert_eq!(selection.suspend_duration, Duration::from_secs(45));
        }
        other => panic!("expected routed, got {:?}", other),
    }

    let prompts = classifier.prompts.lock().unwrap();
    assert!(prompts[0].contains("chat, code"));
    assert!(prompts[0].contains("- code: programming and debugging"));
    assert!(prompts[0].ends_with("fix my loop"));
}

#[tokio::test]
async fn empty_categories_never_classify() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::answering("code");
    let resolver = EndpointResolver::new().with_classifier(classifier.clone());

    let resolution = resolver
        .resolve(&policy, Environment::Sandbox, Some(&message("hello")), "api")
        .await;

    assert_eq!(routed(resolution), EndpointRef::new("epS", "gpt-4o-mini"));
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn classifier_failure_uses_default() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::failing();
    let resolver = EndpointResolver::new().with_classifier(classifier.clone());

    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("hello")), "api")
        .await;

    assert_eq!(routed(resolution), EndpointRef::new("epC", "mistral-large"));
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn slow_classifier_times_out_to_default() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::slow("code", Duration::from_secs(5));
    let resolver = EndpointResolver::new()
        .with_classifier(classifier.clone())
        .with_classify_timeout(Duration::from_millis(50));

    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("hello")), "api")
        .await;

    assert_eq!(routed(resolution), EndpointRef::new("epC", "mistral-large"));
}

#[tokio::test]
async fn suspended_endpoints_are_never_selected() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let health = Arc::new(InMemoryHealthRegistry::new());
    let resolver = EndpointResolver::new()
        .with_classifier(ScriptedClassifier::answering("code"))
        .with_health(health.clone());

    health.suspend("api", "epA_gpt-4", Duration::from_secs(60));
    match resolver
        .resolve(&policy, Environment::Production, Some(&message("hello")), "api")
        .await
    {
        Resolution::Routed(selection) => {
            assert_eq!(selection.endpoint, EndpointRef::new("epC", "mistral-large"));
            assert!(selection.used_fallback);
        }
        other => panic!("expected fallback, got {:?}", other),
    }

    // Another scope is unaffected
    let other_scope = resolver
        .resolve(&policy, Environment::Production, Some(&message("hello")), "other-api")
        .await;
    assert_eq!(routed(other_scope), EndpointRef::new("epA", "gpt-4"));

    health.suspend("api", "epC_mistral-large", Duration::from_secs(60));
    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("hello")), "api")
        .await;
    assert_eq!(resolution, Resolution::Reject(RejectReason::AllSuspended));
}

#[tokio::test]
async fn no_category_and_no_default_rejects() {
    let policy = parse_routing_policy(
        r#"{"production":{"categories":{"code":{"endpointId":"epA","model":"gpt-4"}}}}"#,
    )
    .unwrap();
    let resolver = EndpointResolver::new().with_classifier(ScriptedClassifier::answering("poetry"));

    let resolution = resolver
        .resolve(&policy, Environment::Production, Some(&message("a sonnet")), "api")
        .await;
    assert_eq!(resolution, Resolution::Reject(RejectReason::NoCandidateEndpoint));
}

#[tokio::test]
async fn missing_message_skips_classification() {
    let policy = parse_routing_policy(POLICY).unwrap();
    let classifier = ScriptedClassifier::answering("code");
    let resolver = EndpointResolver::new().with_classifier(classifier.clone());

    let resolution = resolver
        .resolve(&policy, Environment::Production, None, "api")
        .await;

    assert_eq!(routed(resolution), EndpointRef::new("epC", "mistral-large"));
    assert_eq!(classifier.calls(), 0);
}
