//! Endpoint routing: classification, health, selection

pub mod classifier;
pub mod health;
pub mod resolver;

pub use classifier::{
    build_prompt, match_category, ChatClassifier, ClassifierError, DisabledClassifier,
    TextClassifier,
};
pub use health::{AlwaysHealthy, HealthRegistry, InMemoryHealthRegistry};
pub use resolver::{
    EndpointResolver, RejectReason, Resolution, RouteSelection, DEFAULT_CLASSIFY_TIMEOUT,
};
