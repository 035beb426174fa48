//! Classifying router

use super::{
    metadata_for, parse_config, BypassReason, InboundRequest, MediationError, MediationOutcome,
    MediatorSettings, ParsedConfig, RewrittenRequest,
};
use crate::adapter::ProtocolAdapter;
use crate::config::{parse_routing_policy, RoutingPolicy};
use crate::protocol::PayloadExtractor;
use crate::routing::{EndpointResolver, Resolution};
use std::sync::Arc;
use tracing::{debug, error};

/// Routes each request to the endpoint of the category its prompt falls in
pub struct RouteMediator {
    policy: ParsedConfig<RoutingPolicy>,
    resolver: Arc<EndpointResolver>,
    adapter: Arc<ProtocolAdapter>,
    settings: MediatorSettings,
}

impl RouteMediator {
    /// Parse `raw_config` once. Parse and validation failures are kept and
    /// returned for every request.
    pub fn new(raw_config: &str, resolver: Arc<EndpointResolver>, adapter: Arc<ProtocolAdapter>) -> Self {
        let policy = parse_config(raw_config, parse_routing_policy);
        if let Err(e) = &policy {
            error!(error = %e, "routing config rejected, requests will fail");
        }

        Self {
            policy,
            resolver,
            adapter,
            settings: MediatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MediatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn policy(&self) -> Option<&RoutingPolicy> {
        self.policy.as_ref().ok().and_then(Option::as_ref)
    }

    pub async fn mediate(&self, request: &InboundRequest) -> Result<MediationOutcome, MediationError> {
        let policy = match &self.policy {
            Ok(Some(policy)) => policy,
            Ok(None) => {
                debug!("no routing config, bypassing");
                return Ok(MediationOutcome::Bypass(BypassReason::EmptyConfig));
            }
            Err(e) => return Err(e.clone()),
        };

        let message = PayloadExtractor::extract_non_blank(&request.payload);

        let selection = match self
            .resolver
            .resolve(policy, request.environment, message.as_ref(), &request.scope.key)
            .await
        {
            Resolution::Routed(selection) => selection,
            Resolution::Reject(reason) => {
                debug!(%reason, env = %request.environment, "rejecting request");
                return Ok(MediationOutcome::Reject(reason));
            }
        };

        let Some(message) = message else {
            debug!(endpoint_id = %selection.endpoint.endpoint_id, "no user message, forwarding payload unchanged");
            return Ok(MediationOutcome::Bypass(BypassReason::NoUserMessage));
        };

        let outbound = self
            .adapter
            .adapt(&selection.endpoint, &message, &request.scope, self.settings.params)
            .inspect_err(|e| error!(error = %e, endpoint_id = %selection.endpoint.endpoint_id, "failed to adapt request"))?;

        let metadata = metadata_for(&selection, &outbound, self.settings.timeout_ms);
        debug!(
            request_id = %metadata.request_id,
            endpoint_id = %metadata.endpoint_id,
            provider = %metadata.provider,
            category = ?metadata.category,
            "request rewritten"
        );

        Ok(MediationOutcome::Rewritten(Box::new(RewrittenRequest {
            request: outbound,
            metadata,
        })))
    }
}
