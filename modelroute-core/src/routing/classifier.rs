//! Prompt classification
//!
//! The resolver asks a [`TextClassifier`] to place the user's prompt in one
//! of the configured categories. Any failure means "no category" and the
//! default endpoint is used; classification is never retried.

use crate::config::{ClassifierSettings, SecretString};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default user agent
const USER_AGENT: &str = concat!("modelroute/", env!("CARGO_PKG_VERSION"));

/// Errors a classifier can report. The resolver treats all of them the same.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier is not configured")]
    Unavailable,

    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier response is malformed: {0}")]
    MalformedResponse(String),
}

/// A model that answers a classification prompt with a category name
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Whether the classifier is configured well enough to be called
    fn is_available(&self) -> bool;

    /// Send `prompt` and return the raw answer, if the model produced one
    async fn classify(&self, prompt: &str) -> Result<Option<String>, ClassifierError>;
}

/// Build the classification prompt for `message`.
///
/// `candidates` pairs each category name with its optional description.
pub fn build_prompt(candidates: &[(&str, Option<&str>)], message: &str) -> String {
    let names: Vec<&str> = candidates.iter().map(|(name, _)| *name).collect();
    let mut prompt = format!(
        "Classify this request into one of these categories: {}. ",
        names.join(", ")
    );

    let described: Vec<String> = candidates
        .iter()
        .filter_map(|(name, context)| {
            context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| format!("- {}: {}", name, c))
        })
        .collect();
    if !described.is_empty() {
        prompt.push_str("Category descriptions:\n");
        prompt.push_str(&described.join("\n"));
        prompt.push('\n');
    }

    prompt.push_str("Respond with exactly one category name from the list for this request: ");
    prompt.push_str(message);
    prompt
}

/// Map a classifier answer onto a candidate category.
///
/// An exact match of the trimmed answer wins. Otherwise the first candidate
/// (in the given order) where one of answer and candidate contains the other,
/// ignoring case, is accepted.
pub fn match_category<'a>(answer: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().copied().find(|c| *c == answer) {
        return Some(exact);
    }

    let answer_lower = answer.to_lowercase();
    candidates.iter().copied().find(|candidate| {
        let candidate_lower = candidate.to_lowercase();
        !candidate_lower.is_empty()
            && (answer_lower.contains(&candidate_lower) || candidate_lower.contains(&answer_lower))
    })
}

/// Classifier used when none is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledClassifier;

#[async_trait]
impl TextClassifier for DisabledClassifier {
    fn is_available(&self) -> bool {
        false
    }

    async fn classify(&self, _prompt: &str) -> Result<Option<String>, ClassifierError> {
        Err(ClassifierError::Unavailable)
    }
}

/// Classifier backed by an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatClassifier {
    client: Client,
    url: String,
    model: String,
    api_key: SecretString,
    enabled: bool,
}

impl ChatClassifier {
    /// Create a classifier with a client bounded by `timeout`
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
            enabled: true,
        })
    }

    /// Create a classifier from the settings file section
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        let mut classifier = Self::new(
            settings.url.clone(),
            settings.model.clone(),
            settings.api_key.clone(),
            Duration::from_millis(settings.timeout_ms),
        )?;
        classifier.enabled = settings.enabled;
        Ok(classifier)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": 20,
            "temperature": 0.0,
        })
    }

    fn answer_from(response: &Value) -> Result<Option<String>, ClassifierError> {
        let choices = response
            .get("choices")
            .and_then(Value::as_array)
            .ok_or_else(|| ClassifierError::MalformedResponse("missing 'choices' array".to_string()))?;

        Ok(choices
            .first()
            .and_then(|choice| choice.pointer("/message/content"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
            .map(str::to_string))
    }
}

#[async_trait]
impl TextClassifier for ChatClassifier {
    fn is_available(&self) -> bool {
        self.enabled && !self.url.trim().is_empty() && !self.api_key.is_blank()
    }

    async fn classify(&self, prompt: &str) -> Result<Option<String>, ClassifierError> {
        if !self.is_available() {
            return Err(ClassifierError::Unavailable);
        }

        debug!(url = %self.url, model = %self.model, "sending classification request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response.json().await?;
        Self::answer_from(&value)
    }
}
