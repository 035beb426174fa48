//! Authentication headers per provider scheme

use super::catalog::AuthScheme;
use crate::config::SecretString;
use std::collections::HashMap;
use tracing::warn;

/// Insert the headers `scheme` requires for `api_key` into `headers`.
///
/// Every scheme maps to exactly one header set.
pub fn apply_auth_headers(
    headers: &mut HashMap<String, String>,
    scheme: AuthScheme,
    api_key: &SecretString,
) {
    let key = api_key.expose_secret();
    match scheme {
        AuthScheme::Bearer => {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
        }
        AuthScheme::BearerWithReferer(referer) => {
            headers.insert("Authorization".to_string(), format!("Bearer {}", key));
            headers.insert("HTTP-Referer".to_string(), referer.to_string());
        }
        AuthScheme::Anthropic { version } => {
            headers.insert("x-api-key".to_string(), key.to_string());
            headers.insert("anthropic-version".to_string(), version.to_string());
        }
        AuthScheme::GoogleApiKey => {
            if key.starts_with("AIza") {
                headers.insert("x-goog-api-key".to_string(), key.to_string());
            } else {
                headers.insert("Authorization".to_string(), format!("Bearer {}", key));
            }
        }
        AuthScheme::ApiKeyHeader(name) => {
            headers.insert(name.to_string(), key.to_string());
        }
        AuthScheme::AwsSigV4Placeholder => {
            // TODO: replace with real SigV4 signing (access key, secret, region, payload hash)
            warn!("AWS Bedrock requests carry a placeholder Authorization header; SigV4 signing is not implemented");
            headers.insert(
                "Authorization".to_string(),
                format!("AWS4-HMAC-SHA256 {}", key),
            );
        }
        AuthScheme::None => {}
    }
}
