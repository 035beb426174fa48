//! Secrets handling and redaction
//!
//! API keys travel through configuration, registries and outbound headers.
//! This module keeps them out of logs:
//! - [`SecretString`] redacts itself in `Display`/`Debug` output
//! - [`redact_by_field_name`] masks values of sensitive-looking field or header names
//! - [`SafeLogging`] gives types a loggable rendering

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A trait for types that can be logged safely
pub trait SafeLogging {
    /// Returns a safe version for logging
    fn safe_for_logging(&self) -> String;
}

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "api-key",
    "apikey",
    "secret",
    "token",
    "password",
    "credential",
    "auth",
    "private",
    "passphrase",
];

/// Whether a field or header name looks like it carries a secret
pub fn is_sensitive_name(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| field_lower.contains(pattern))
}

/// Replace a value with `[REDACTED]` if its name looks sensitive
pub fn redact_by_field_name(field_name: &str, value: &str) -> String {
    if is_sensitive_name(field_name) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "sk-1234567890abcdef");
    }

    #[test]
    fn test_redact_header_names() {
        assert_eq!(redact_by_field_name("Authorization", "Bearer x"), "[REDACTED]");
        assert_eq!(redact_by_field_name("x-api-key", "sk-ant"), "[REDACTED]");
        assert_eq!(redact_by_field_name("x-goog-api-key", "AIza"), "[REDACTED]");
        assert_eq!(redact_by_field_name("Content-Type", "application/json"), "application/json");
        assert_eq!(redact_by_field_name("anthropic-version", "2023-06-01"), "2023-06-01");
    }
}
