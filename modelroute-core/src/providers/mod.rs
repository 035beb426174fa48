//! Provider dialects
//!
//! This module describes the upstream LLM providers the gateway can target:
//! which provider a model/endpoint belongs to, how its request body is
//! shaped, and how it expects to be authenticated.

pub mod auth;
pub mod catalog;
pub mod detect;
pub mod templates;

pub use auth::apply_auth_headers;
pub use catalog::{AuthScheme, ProviderCatalog, ProviderId, ProviderProfile, RequestShape};
pub use detect::ProviderDetector;
