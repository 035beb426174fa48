//! User message extraction from arbitrary inbound payloads
//!
//! Clients talk to the gateway in whatever dialect they already use. The
//! extractor pulls out a single user message so the adapter can rebuild the
//! request in the target provider's format:
//!
//! 1. a direct `{"message": "...", "model": "..."}` body (the `model` is
//!    ignored: the target model always comes from the routing decision);
//! 2. otherwise the first recognized key present in the payload text decides
//!    the branch, in priority order `messages`, `prompt`, `input`, `text`,
//!    `query`, `question`;
//! 3. a payload with none of those keys is forwarded verbatim as the message.
//!
//! A recognized key whose path does not resolve ends extraction for that
//! payload; it never falls through to a lower-priority key.

use super::types::UserMessage;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Top-level keys recognized after the direct format, in priority order
const PRIORITY_KEYS: [&str; 6] = ["messages", "prompt", "input", "text", "query", "question"];

/// Direct gateway input format
#[derive(Debug, Deserialize)]
struct DirectInput {
    message: Option<String>,
    #[allow(dead_code)]
    model: Option<String>,
}

/// Outcome of a keyed extraction attempt
#[derive(Debug, PartialEq, Eq)]
enum KeyedExtraction {
    /// No recognized key appears in the payload text
    NoKey,
    /// A key was present and resolved to text
    Found(String),
    /// A key was present but its path did not resolve
    Unresolved(&'static str),
    /// A key appears in the text but the payload is not JSON
    Unparseable,
}

/// Stateless payload extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadExtractor;

impl PayloadExtractor {
    /// Extract the user message from a raw payload.
    ///
    /// Returns `None` when the payload is empty or a recognized key fails to
    /// resolve. A returned message may still be blank; callers treat that as
    /// "no message".
    pub fn extract(raw: &str) -> Option<UserMessage> {
        if raw.trim().is_empty() {
            return None;
        }

        if let Some(message) = Self::direct_message(raw) {
            debug!("Parsed user input from direct message format");
            return Some(UserMessage::new(message, raw));
        }

        match Self::keyed_message(raw) {
            KeyedExtraction::Found(text) => Some(UserMessage::new(text, raw)),
            KeyedExtraction::Unresolved(key) => {
                debug!(key, "Recognized key present but no message resolved");
                None
            }
            KeyedExtraction::Unparseable => {
                debug!("Payload mentions a message key but is not JSON; forwarding raw text");
                Some(UserMessage::new(raw, raw))
            }
            KeyedExtraction::NoKey => Some(UserMessage::new(raw, raw)),
        }
    }

    /// Extract and drop blank results in one step
    pub fn extract_non_blank(raw: &str) -> Option<UserMessage> {
        Self::extract(raw).filter(|m| !m.is_blank())
    }

    /// Only a JSON object qualifies; serde would also map arrays onto the struct
    fn direct_message(raw: &str) -> Option<String> {
        let value: Value = serde_json::from_str(raw).ok()?;
        if !value.is_object() {
            return None;
        }
        let input: DirectInput = serde_json::from_value(value).ok()?;
        input.message.filter(|m| !m.trim().is_empty())
    }

    fn keyed_message(raw: &str) -> KeyedExtraction {
        let Some(key) = PRIORITY_KEYS.iter().copied().find(|k| raw.contains(k)) else {
            return KeyedExtraction::NoKey;
        };

        let Ok(document) = serde_json::from_str::<Value>(raw) else {
            return KeyedExtraction::Unparseable;
        };

        let found = match key {
            "messages" => first_message_text(&document),
            _ => document.get(key).and_then(Value::as_str).map(str::to_string),
        };

        match found {
            Some(text) => KeyedExtraction::Found(text),
            None => KeyedExtraction::Unresolved(key),
        }
    }
}

/// `messages[0].content`, falling back to `messages[0].text`
fn first_message_text(document: &Value) -> Option<String> {
    let first = document.get("messages")?.get(0)?;
    first
        .get("content")
        .and_then(content_text)
        .or_else(|| first.get("text").and_then(Value::as_str).map(str::to_string))
}

/// Plain string content, or the joined text parts of multimodal content
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            (!texts.is_empty()).then(|| texts.join("\n"))
        }
        _ => None,
    }
}
