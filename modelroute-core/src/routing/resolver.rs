//! Endpoint selection
//!
//! Picks the endpoint a request should go to: the deployment config for the
//! request's environment, a category chosen by the classifier (or the
//! default), then a health check with fallback to the default endpoint.

use super::classifier::{build_prompt, match_category, DisabledClassifier, TextClassifier};
use super::health::{AlwaysHealthy, HealthRegistry};
use crate::config::{DeploymentConfig, RoutingPolicy, SingleTargetPolicy};
use crate::protocol::{EndpointRef, Environment, UserMessage};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upper bound on one classification call
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Why no endpoint was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The policy has no entry for the request's environment
    NoPolicyForEnvironment,
    /// Neither a category nor a default endpoint applies
    NoCandidateEndpoint,
    /// The chosen endpoint is suspended and no healthy default remains
    AllSuspended,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPolicyForEnvironment => "no_policy_for_environment",
            Self::NoCandidateEndpoint => "no_candidate_endpoint",
            Self::AllSuspended => "all_suspended",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected endpoint and how it was reached
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSelection {
    pub endpoint: EndpointRef,
    /// Category the classifier matched, if any
    pub category: Option<String>,
    /// The default replaced a suspended choice
    pub used_fallback: bool,
    /// How long the failure tracker should suspend this endpoint on failure
    pub suspend_duration: Duration,
}

/// Outcome of endpoint resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Routed(RouteSelection),
    Reject(RejectReason),
}

impl Resolution {
    pub fn is_routed(&self) -> bool {
        matches!(self, Resolution::Routed(_))
    }
}

/// Selects endpoints from routing policies
pub struct EndpointResolver {
    classifier: Arc<dyn TextClassifier>,
    health: Arc<dyn HealthRegistry>,
    classify_timeout: Duration,
}

impl Default for EndpointResolver {
    fn default() -> Self {
        Self {
            classifier: Arc::new(DisabledClassifier),
            health: Arc::new(AlwaysHealthy),
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }
}

impl EndpointResolver {
    /// Resolver without a classifier that treats every endpoint as healthy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_health(mut self, health: Arc<dyn HealthRegistry>) -> Self {
        self.health = health;
        self
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Select the endpoint for a classifying-router policy.
    ///
    /// A missing or blank `message` skips classification and goes straight
    /// to the default endpoint.
    pub async fn resolve(
        &self,
        policy: &RoutingPolicy,
        env: Environment,
        message: Option<&UserMessage>,
        scope_key: &str,
    ) -> Resolution {
        let Some(deployment) = policy.deployment(env) else {
            debug!(%env, "no deployment config for environment");
            return Resolution::Reject(RejectReason::NoPolicyForEnvironment);
        };

        let category = match message.filter(|m| !m.is_blank()) {
            Some(message) => self.classify(deployment, message).await,
            None => {
                debug!("no user message to classify, using default model");
                None
            }
        };

        let chosen = category
            .as_deref()
            .and_then(|name| deployment.categories.get(name))
            .map(|route| &route.endpoint)
            .or_else(|| deployment.default_endpoint());

        let Some(chosen) = chosen else {
            debug!(?category, "no endpoint for category and no default model");
            return Resolution::Reject(RejectReason::NoCandidateEndpoint);
        };

        let (endpoint, used_fallback) = if self.is_suspended(scope_key, chosen) {
            match deployment
                .default_endpoint()
                .filter(|default| *default != chosen)
                .filter(|default| !self.is_suspended(scope_key, default))
            {
                Some(default) => {
                    warn!(
                        suspended = %chosen.endpoint_key(),
                        fallback = %default.endpoint_key(),
                        "selected endpoint is suspended, falling back to default model"
                    );
                    (default, true)
                }
                None => {
                    warn!(suspended = %chosen.endpoint_key(), "selected endpoint is suspended and no healthy default remains");
                    return Resolution::Reject(RejectReason::AllSuspended);
                }
            }
        } else {
            (chosen, false)
        };

        debug!(
            endpoint_id = %endpoint.endpoint_id,
            model = %endpoint.model,
            ?category,
            used_fallback,
            "resolved endpoint"
        );

        Resolution::Routed(RouteSelection {
            endpoint: endpoint.clone(),
            category,
            used_fallback,
            suspend_duration: policy.suspend_duration(),
        })
    }

    /// Select the endpoint for a one-endpoint-per-environment policy
    pub fn resolve_single(
        &self,
        policy: &SingleTargetPolicy,
        env: Environment,
        scope_key: &str,
    ) -> Resolution {
        let Some(target) = policy.target(env) else {
            debug!(%env, "no target configured for environment");
            return Resolution::Reject(RejectReason::NoPolicyForEnvironment);
        };

        if self.is_suspended(scope_key, target) {
            warn!(suspended = %target.endpoint_key(), "target endpoint is suspended");
            return Resolution::Reject(RejectReason::AllSuspended);
        }

        Resolution::Routed(RouteSelection {
            endpoint: target.clone(),
            category: None,
            used_fallback: false,
            suspend_duration: Duration::ZERO,
        })
    }

    fn is_suspended(&self, scope_key: &str, endpoint: &EndpointRef) -> bool {
        self.health.is_suspended(scope_key, &endpoint.endpoint_key())
    }

    /// Ask the classifier for a category. Every failure is "no category".
    async fn classify(&self, deployment: &DeploymentConfig, message: &UserMessage) -> Option<String> {
        let candidates = deployment.candidate_categories();
        if candidates.is_empty() {
            debug!("no valid categories configured, using default model");
            return None;
        }

        if !self.classifier.is_available() {
            debug!("classifier not available, using default model");
            return None;
        }

        let described: Vec<(&str, Option<&str>)> = candidates
            .iter()
            .map(|name| {
                let context = deployment
                    .categories
                    .get(*name)
                    .and_then(|route| route.context.as_deref());
                (*name, context)
            })
            .collect();
        let prompt = build_prompt(&described, message.text());

        let answer = match tokio::time::timeout(self.classify_timeout, self.classifier.classify(&prompt)).await {
            Ok(Ok(Some(answer))) => answer,
            Ok(Ok(None)) => {
                debug!("classifier gave no answer, using default model");
                return None;
            }
            Ok(Err(e)) => {
                debug!(error = %e, "classification failed, using default model");
                return None;
            }
            Err(_) => {
                debug!(timeout_ms = self.classify_timeout.as_millis() as u64, "classification timed out, using default model");
                return None;
            }
        };

        match match_category(&answer, &candidates) {
            Some(category) => {
                debug!(%category, "classified request");
                Some(category.to_string())
            }
            None => {
                debug!(%answer, "classifier answer matches no category, using default model");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::classifier::ClassifierError;
    use crate::routing::health::InMemoryHealthRegistry;
    use async_trait::async_trait;

    struct FixedAnswer(Option<&'static str>);

    #[async_trait]
    impl TextClassifier for FixedAnswer {
        fn is_available(&self) -> bool {
            true
        }

        async fn classify(&self, _prompt: &str) -> Result<Option<String>, ClassifierError> {
            Ok(self.0.map(str::to_string))
        }
    }

    fn policy() -> RoutingPolicy {
        serde_json::from_str(
            r#"{
                "production": {
                    "categories": {
                        "code": {"endpointId": "epA", "model": "gpt-4"},
                        "math": {"endpointId": "epB", "model": "claude-3"}
                    },
                    "defaultModel": {"endpointId": "epC", "model": "mistral-large"}
                },
                "suspendDuration": 30
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_environment_rejects() {
        let resolver = EndpointResolver::new();
        let resolution = resolver
            .resolve(&policy(), Environment::Sandbox, None, "api")
            .await;
        assert_eq!(resolution, Resolution::Reject(RejectReason::NoPolicyForEnvironment));
    }

    #[tokio::test]
    async fn suspended_category_falls_back_to_default() {
        let health = Arc::new(InMemoryHealthRegistry::new());
        health.suspend("api", "epB_claude-3", Duration::from_secs(60));
        let resolver = EndpointResolver::new()
            .with_classifier(Arc::new(FixedAnswer(Some("math"))))
            .with_health(health);

        let message = UserMessage::new("integrate x^2", "{}");
        match resolver.resolve(&policy(), Environment::Production, Some(&message), "api").await {
            Resolution::Routed(selection) => {
                assert_eq!(selection.endpoint, EndpointRef::new("epC", "mistral-large"));
                assert_eq!(selection.category.as_deref(), Some("math"));
                assert!(selection.used_fallback);
                assert_eq!(selection.suspend_duration, Duration::from_secs(30));
            }
            other => panic!("expected routed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn suspended_default_rejects() {
        let health = Arc::new(InMemoryHealthRegistry::new());
        health.suspend("api", "epC_mistral-large", Duration::from_secs(60));
        let resolver = EndpointResolver::new().with_health(health);

        let resolution = resolver
            .resolve(&policy(), Environment::Production, None, "api")
            .await;
        assert_eq!(resolution, Resolution::Reject(RejectReason::AllSuspended));
    }

    /// Reports the first endpoint it is asked about as suspended
    struct FirstLookupSuspended(std::sync::atomic::AtomicUsize);

    impl HealthRegistry for FirstLookupSuspended {
        fn is_suspended(&self, _scope_key: &str, _endpoint_key: &str) -> bool {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0
        }
    }

    #[tokio::test]
    async fn fallback_compares_refs_not_health_keys() {
        let policy: RoutingPolicy = serde_json::from_str(
            r#"{"production":{
                "categories":{"code":{"endpointId":"a","model":"b_c"}},
                "defaultModel":{"endpointId":"a_b","model":"c"}
            }}"#,
        )
        .unwrap();
        let chosen = EndpointRef::new("a", "b_c");
        let default = EndpointRef::new("a_b", "c");
        assert_eq!(chosen.endpoint_key(), default.endpoint_key());

        let resolver = EndpointResolver::new()
            .with_classifier(Arc::new(FixedAnswer(Some("code"))))
            .with_health(Arc::new(FirstLookupSuspended(Default::default())));

        let message = UserMessage::new("fix my loop", "{}");
        match resolver.resolve(&policy, Environment::Production, Some(&message), "api").await {
            Resolution::Routed(selection) => {
                assert_eq!(selection.endpoint, default);
                assert!(selection.used_fallback);
            }
            other => panic!("expected fallback to the default, got {:?}", other),
        }
    }

    #[test]
    fn single_target_checks_health() {
        let target: SingleTargetPolicy =
            serde_json::from_str(r#"{"production":{"endpointId":"ep1","model":"gpt-4"}}"#).unwrap();
        let health = Arc::new(InMemoryHealthRegistry::new());
        let resolver = EndpointResolver::new().with_health(health.clone());

        assert!(resolver.resolve_single(&target, Environment::Production, "api").is_routed());
        assert_eq!(
            resolver.resolve_single(&target, Environment::Sandbox, "api"),
            Resolution::Reject(RejectReason::NoPolicyForEnvironment)
        );

        health.suspend("api", "ep1_gpt-4", Duration::from_secs(60));
        assert_eq!(
            resolver.resolve_single(&target, Environment::Production, "api"),
            Resolution::Reject(RejectReason::AllSuspended)
        );
    }
}
