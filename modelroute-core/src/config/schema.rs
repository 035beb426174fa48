//! Gateway settings file schema with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root settings structure for the gateway engine
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    /// Schema version (required - no default)
    pub version: String,

    /// Model used to classify prompts into routing categories
    #[serde(default)]
    pub classifier: Option<ClassifierSettings>,

    /// Request construction defaults
    #[serde(default)]
    pub adapter: AdapterSettings,

    /// Statically known endpoints, registered at startup
    #[serde(default)]
    pub endpoints: Vec<EndpointEntry>,
}

/// Connection to the classification model
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierSettings {
    /// OpenAI-compatible chat-completions URL
    pub url: String,

    pub model: String,

    /// API key (supports environment variable interpolation)
    #[serde(default)]
    pub api_key: SecretString,

    /// Upper bound on one classification call
    #[serde(default = "default_classify_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// What the adapter does when no credential can be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCredentials {
    /// Build the request without authentication headers and log a warning
    #[default]
    Proceed,
    /// Fail the adaptation
    Reject,
}

/// Defaults applied while building upstream requests
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterSettings {
    #[serde(default)]
    pub missing_credentials: MissingCredentials,

    /// Upstream timeout reported in routing metadata
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            missing_credentials: MissingCredentials::default(),
            timeout_ms: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// A statically registered upstream endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointEntry {
    pub id: String,

    pub url: String,

    /// Provider name; detected from the URL when absent
    #[serde(default)]
    pub provider: Option<String>,

    /// API key (supports environment variable interpolation)
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

fn default_true() -> bool { true }
fn default_classify_timeout() -> u64 { 5000 }
fn default_timeout() -> u64 { 30000 }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f64 { 0.7 }

impl GatewaySettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        // Currently support only version 0.1
        if self.version != "0.1" {
            return Err(ValidationError::invalid_value("version", "0.1", &self.version));
        }

        if let Some(classifier) = &self.classifier {
            classifier.validate("classifier")?;
        }

        self.adapter.validate("adapter")?;

        let mut seen_ids = HashSet::new();
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if !seen_ids.insert(endpoint.id.as_str()) {
                return Err(ValidationError::new(
                    format!("endpoints[{}].id", i),
                    ValidationErrorKind::DuplicateValue {
                        value: endpoint.id.clone(),
                    },
                ));
            }
            endpoint.validate(&format!("endpoints[{}]", i))?;
        }

        Ok(())
    }
}

impl ClassifierSettings {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        validate_url(&format!("{}.url", path), &self.url)?;

        if self.model.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }

        if self.timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.timeout_ms", path),
                "Timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl AdapterSettings {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        validate_generation(
            &format!("{}.max_tokens", path),
            self.max_tokens,
            &format!("{}.temperature", path),
            self.temperature,
        )?;

        if self.timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.timeout_ms", path),
                "Timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl EndpointEntry {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.id", path)));
        }
        validate_url(&format!("{}.url", path), &self.url)
    }
}

/// Require an absolute http(s) URL
pub(crate) fn validate_url(field_path: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field_path));
    }

    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ValidationError::invalid_url(
            field_path,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => Err(ValidationError::invalid_url(field_path, e.to_string())),
    }
}

/// Generation bounds shared by adapter defaults and direct targets
pub(crate) fn validate_generation(
    max_tokens_path: &str,
    max_tokens: u32,
    temperature_path: &str,
    temperature: f64,
) -> Result<(), ValidationError> {
    if max_tokens == 0 {
        return Err(ValidationError::out_of_range(
            max_tokens_path,
            "max_tokens must be greater than 0",
        ));
    }

    if !(0.0..=2.0).contains(&temperature) {
        return Err(ValidationError::out_of_range(
            temperature_path,
            format!("temperature must be between 0.0 and 2.0, got {}", temperature),
        ));
    }

    Ok(())
}
