//! Protocol module: request-level data shared across the routing pipeline
//!
//! - [`types`]: endpoint references, environments, extracted messages and the
//!   rewritten outbound request
//! - [`extract`]: pulls a single user message out of an inbound payload

pub mod extract;
pub mod types;

pub use extract::PayloadExtractor;
pub use types::{
    EndpointRef, Environment, GenerationParams, OutboundRequest, RequestScope, RoutingMetadata,
    UserMessage,
};
