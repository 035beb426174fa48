//! Modelroute Core Library
//!
//! Policy-driven LLM endpoint routing for API gateways. For each inbound
//! request the engine extracts the user's message, picks a target endpoint
//! from the API's routing policy (optionally asking a classifier model which
//! category the prompt belongs to), and rebuilds the request in the target
//! provider's native format with the right authentication headers.
//!
//! ```no_run
//! use modelroute_core::mediator::InboundRequest;
//! use modelroute_core::protocol::RequestScope;
//! use modelroute_core::RoutingEngine;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RoutingEngine::from_file("gateway.yaml")?;
//! let mediator = engine.route_mediator(
//!     r#"{"production":{"defaultModel":{"endpointId":"openai-prod","model":"gpt-4o"}}}"#,
//! );
//! let request = InboundRequest::from_key_type(
//!     r#"{"prompt":"Write a haiku"}"#,
//!     Some("PRODUCTION"),
//!     RequestScope::new("api-42"),
//! );
//! let _outcome = mediator.mediate(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod engine;
pub mod mediator;
pub mod protocol;
pub mod providers;
pub mod routing;

pub use adapter::{AdapterError, ProtocolAdapter};
pub use engine::{EngineError, RoutingEngine};
pub use mediator::{MediationError, MediationOutcome};
pub use providers::{ProviderDetector, ProviderId};

/// Returns the version of the Modelroute Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
