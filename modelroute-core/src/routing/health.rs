//! Endpoint suspension state
//!
//! A failure tracker outside the routing core marks endpoints as suspended
//! for a while after they fail; the resolver only reads that state.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Read access to endpoint suspension state
pub trait HealthRegistry: Send + Sync {
    /// Whether `endpoint_key` is suspended for requests under `scope_key`
    fn is_suspended(&self, scope_key: &str, endpoint_key: &str) -> bool;
}

/// Process-wide suspension table keyed by `(scope key, endpoint key)`
#[derive(Debug, Default)]
pub struct InMemoryHealthRegistry {
    suspended_until: DashMap<(String, String), DateTime<Utc>>,
}

impl InMemoryHealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend an endpoint until `until`
    pub fn suspend_until(&self, scope_key: &str, endpoint_key: &str, until: DateTime<Utc>) {
        self.suspended_until
            .insert((scope_key.to_string(), endpoint_key.to_string()), until);
    }

    /// Suspend an endpoint for `duration` from now
    pub fn suspend(&self, scope_key: &str, endpoint_key: &str, duration: Duration) {
        let span = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX);
        let until = Utc::now().checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.suspend_until(scope_key, endpoint_key, until);
    }

    /// Lift a suspension
    pub fn clear(&self, scope_key: &str, endpoint_key: &str) {
        self.suspended_until
            .remove(&(scope_key.to_string(), endpoint_key.to_string()));
    }

    /// When the suspension ends, if there is one on record
    pub fn suspended_until(&self, scope_key: &str, endpoint_key: &str) -> Option<DateTime<Utc>> {
        self.suspended_until
            .get(&(scope_key.to_string(), endpoint_key.to_string()))
            .map(|entry| *entry.value())
    }
}

impl HealthRegistry for InMemoryHealthRegistry {
    fn is_suspended(&self, scope_key: &str, endpoint_key: &str) -> bool {
        self.suspended_until(scope_key, endpoint_key)
            .is_some_and(|until| until > Utc::now())
    }
}

/// Registry in which nothing is ever suspended
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysHealthy;

impl HealthRegistry for AlwaysHealthy {
    fn is_suspended(&self, _scope_key: &str, _endpoint_key: &str) -> bool {
        false
    }
}
