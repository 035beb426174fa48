//! Wiring from a settings file to ready-to-use mediators

use crate::adapter::{InMemoryRegistry, ProtocolAdapter};
use crate::config::{self, ConfigResult, GatewaySettings};
use crate::mediator::{MediatorSettings, RequestChangeMediator, RouteMediator};
use crate::routing::{
    ChatClassifier, ClassifierError, EndpointResolver, HealthRegistry, InMemoryHealthRegistry,
    TextClassifier,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while assembling the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("failed to build classifier: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Shared collaborators for every mediator of a gateway
pub struct RoutingEngine {
    registry: Arc<InMemoryRegistry>,
    health: Arc<dyn HealthRegistry>,
    resolver: Arc<EndpointResolver>,
    adapter: Arc<ProtocolAdapter>,
    settings: MediatorSettings,
}

impl RoutingEngine {
    /// Build from loaded settings, with a fresh in-memory health registry
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, EngineError> {
        Self::with_health(settings, Arc::new(InMemoryHealthRegistry::new()))
    }

    /// Build from loaded settings, reading suspensions from `health`
    pub fn with_health(settings: &GatewaySettings, health: Arc<dyn HealthRegistry>) -> Result<Self, EngineError> {
        let registry = Arc::new(InMemoryRegistry::from_settings(settings));

        let mut resolver = EndpointResolver::new().with_health(health.clone());
        if let Some(classifier_settings) = &settings.classifier {
            let classifier: Arc<dyn TextClassifier> = Arc::new(ChatClassifier::from_settings(classifier_settings)?);
            resolver = resolver
                .with_classifier(classifier)
                .with_classify_timeout(Duration::from_millis(classifier_settings.timeout_ms));
        }

        let adapter = ProtocolAdapter::builder()
            .registry(registry.clone())
            .missing_credentials(settings.adapter.missing_credentials)
            .build();

        info!(
            endpoints = settings.endpoints.len(),
            classifier = settings.classifier.is_some(),
            "routing engine ready"
        );

        Ok(Self {
            registry,
            health,
            resolver: Arc::new(resolver),
            adapter: Arc::new(adapter),
            settings: MediatorSettings::from(&settings.adapter),
        })
    }

    /// Load a YAML or JSON settings file (by extension) and build the engine
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let settings = load_settings(path.as_ref())?;
        Self::from_settings(&settings)
    }

    /// Mediator for a classifying-router config blob
    pub fn route_mediator(&self, raw_config: &str) -> RouteMediator {
        RouteMediator::new(raw_config, self.resolver.clone(), self.adapter.clone())
            .with_settings(self.settings)
    }

    /// Mediator for a request-change config blob
    pub fn request_change_mediator(&self, raw_config: &str) -> RequestChangeMediator {
        RequestChangeMediator::new(raw_config, self.resolver.clone(), self.adapter.clone())
            .with_settings(self.settings)
    }

    /// Endpoint registry seeded from the settings file; updates are seen by all mediators
    pub fn registry(&self) -> &Arc<InMemoryRegistry> {
        &self.registry
    }

    pub fn health(&self) -> &Arc<dyn HealthRegistry> {
        &self.health
    }
}

fn load_settings(path: &Path) -> ConfigResult<GatewaySettings> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => config::load_from_json(path),
        _ => config::load_from_yaml(path),
    }
}
